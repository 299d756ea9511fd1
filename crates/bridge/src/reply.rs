use {
    jirabot_channels::OutboundMessage,
    jirabot_jira::{Issue, IssueResult},
};

/// Sent for unknown issues and failed lookups alike.
pub const APOLOGY: &str = "Sorry, there is no such Ticket...";

/// Builds the plain and HTML reply bodies for a lookup result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyFormatter {
    escape_html_summary: bool,
}

impl ReplyFormatter {
    pub fn new(escape_html_summary: bool) -> Self {
        Self {
            escape_html_summary,
        }
    }

    pub fn format(&self, result: &IssueResult) -> OutboundMessage {
        match result {
            IssueResult::Found(issue) => self.issue(issue),
            IssueResult::NotFound => self.apology(),
        }
    }

    pub fn apology(&self) -> OutboundMessage {
        OutboundMessage::text(APOLOGY)
    }

    fn issue(&self, issue: &Issue) -> OutboundMessage {
        let plain = format!("{}:\n{}", issue.key, issue.summary);
        let summary = if self.escape_html_summary {
            escape_html(&issue.summary)
        } else {
            issue.summary.clone()
        };
        let html = format!("{}:\n<code><pre>{summary}</code></pre>", issue.key);
        OutboundMessage::rich(plain, html)
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(key: &str, summary: &str) -> IssueResult {
        IssueResult::Found(Issue {
            key: key.into(),
            summary: summary.into(),
        })
    }

    #[test]
    fn found_issue_has_plain_and_html() {
        let reply = ReplyFormatter::default().format(&found("XYZ-1", "Fix bug"));
        assert_eq!(reply.plain_body, "XYZ-1:\nFix bug");
        assert_eq!(
            reply.html_body.as_deref(),
            Some("XYZ-1:\n<code><pre>Fix bug</code></pre>")
        );
    }

    #[test]
    fn not_found_is_plain_apology() {
        let reply = ReplyFormatter::default().format(&IssueResult::NotFound);
        assert_eq!(reply.plain_body, "Sorry, there is no such Ticket...");
        assert!(reply.html_body.is_none());
    }

    #[test]
    fn summary_is_verbatim_by_default() {
        let reply = ReplyFormatter::default().format(&found("A-1", "<b>x</b> & y"));
        assert_eq!(
            reply.html_body.as_deref(),
            Some("A-1:\n<code><pre><b>x</b> & y</code></pre>")
        );
    }

    #[test]
    fn escaping_applies_to_html_only() {
        let reply = ReplyFormatter::new(true).format(&found("A-1", r#"<b>"x"</b> & 'y'"#));
        assert_eq!(reply.plain_body, "A-1:\n<b>\"x\"</b> & 'y'");
        assert_eq!(
            reply.html_body.as_deref(),
            Some("A-1:\n<code><pre>&lt;b&gt;&quot;x&quot;&lt;/b&gt; &amp; &#39;y&#39;</code></pre>")
        );
    }
}
