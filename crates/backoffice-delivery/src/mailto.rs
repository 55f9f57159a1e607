use backoffice_core::HostingProposal;

/// A `mailto:` draft for sending hosting options by hand, linking to the share page.
pub fn mailto_draft(proposal: &HostingProposal, share_url: &str) -> String {
    let recipient = proposal.prepared_for.email.trim();
    let greeting = match proposal.prepared_for.name.trim() {
        "" => "Hi,".to_string(),
        name => format!("Hi {name},"),
    };

    let mut body = vec![greeting, String::new()];
    match proposal.intro.trim() {
        "" => body.push("Here are the hosting options we discussed.".to_string()),
        intro => body.push(intro.to_string()),
    }
    body.push(String::new());
    body.push(format!("You can review them here: {share_url}"));

    let signature = proposal.prepared_by.name.trim();
    if !signature.is_empty() {
        body.push(String::new());
        body.push(signature.to_string());
    }

    format!(
        "mailto:{}?subject={}&body={}",
        urlencoding::encode(recipient),
        urlencoding::encode(&proposal.display_label()),
        urlencoding::encode(&body.join("\n"))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::Counterparty;

    #[test]
    fn draft_addresses_the_client_and_links_the_share_page() {
        let proposal = HostingProposal {
            title: "Hosting options for Reyes Bakery".to_string(),
            prepared_for: Counterparty {
                name: "Dana".to_string(),
                email: "dana@reyesbakery.test".to_string(),
                ..Counterparty::default()
            },
            ..HostingProposal::default()
        };

        let draft = mailto_draft(&proposal, "https://studio.test/hosting-options/abc");

        assert!(draft.starts_with(
            "mailto:dana%40reyesbakery.test?subject=Hosting%20options%20for%20Reyes%20Bakery"
        ));
        assert!(draft.contains("Hi%20Dana%2C"));
        assert!(draft.contains("https%3A%2F%2Fstudio.test%2Fhosting-options%2Fabc"));
    }
}
