use serde_json::{json, Value};

use crate::event::CiEvent;

/// Commits listed on the card before the rest is folded into the count.
const MAX_LISTED_COMMITS: usize = 3;

/// Build the Teams message envelope carrying an Adaptive Card that
/// summarizes a CI event: workflow, repository, actor, commit range.
pub fn build_card(event: &CiEvent, event_name: &str, workflow: &str) -> Value {
    let mut body = vec![json!({
        "type": "TextBlock",
        "size": "Large",
        "weight": "Bolder",
        "text": workflow,
    })];

    if let Some(repo) = &event.repository {
        body.push(json!({
            "type": "TextBlock",
            "wrap": true,
            "text": format!("[{}]({})", repo.name, repo.html_url),
        }));
    }

    let mut facts = vec![json!({"title": "Event", "value": event_name})];
    if let Some(sender) = &event.sender {
        let actor = match &sender.url {
            Some(url) => format!("[{}]({})", sender.login, url),
            None => sender.login.clone(),
        };
        facts.push(json!({"title": "Actor", "value": actor}));
    }
    if !event.commits.is_empty() {
        facts.push(json!({"title": "Commits", "value": event.commits.len().to_string()}));
    }
    if let Some(timestamp) = event.head_commit.as_ref().and_then(|hc| hc.timestamp.as_ref()) {
        facts.push(json!({"title": "Pushed at", "value": timestamp}));
    }
    body.push(json!({"type": "FactSet", "facts": facts}));

    for commit in event.commits.iter().take(MAX_LISTED_COMMITS) {
        let subject = commit
            .message
            .as_deref()
            .map(|m| m.lines().next().unwrap_or("").to_string())
            .unwrap_or_default();
        let short_id = commit.id.as_deref().map(|id| id.get(..7).unwrap_or(id));
        let line = match (short_id, &commit.url) {
            (Some(id), Some(url)) => format!("`[{}]({})` {}", id, url, subject),
            (Some(id), None) => format!("`{}` {}", id, subject),
            _ => subject,
        };
        if !line.is_empty() {
            body.push(json!({
                "type": "TextBlock",
                "wrap": true,
                "spacing": "Small",
                "text": line,
            }));
        }
    }

    let mut actions = Vec::new();
    if let Some(compare) = &event.compare {
        actions.push(json!({
            "type": "Action.OpenUrl",
            "title": "View changes",
            "url": compare,
        }));
    }

    json!({
        "type": "message",
        "attachments": [{
            "contentType": "application/vnd.microsoft.card.adaptive",
            "contentUrl": null,
            "content": {
                "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
                "type": "AdaptiveCard",
                "version": "1.4",
                "body": body,
                "actions": actions,
            }
        }]
    })
}
