//! Webhook payload rendering.

use mqguard_events::BrokerEvent;

/// Render the request body for one delivery.
///
/// With a template, every `{{placeholder}}` is substituted with the
/// corresponding event field (empty string when absent). Without one,
/// the event is serialized as a JSON object.
pub fn render_payload(template: Option<&str>, event: &BrokerEvent) -> String {
    match template {
        Some(template) => render_template(template, event),
        None => serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string()),
    }
}

fn render_template(template: &str, event: &BrokerEvent) -> String {
    let substitutions: [(&str, &str); 7] = [
        ("{{event_type}}", &event.event_type),
        ("{{client_id}}", event.client_id.as_deref().unwrap_or("")),
        ("{{username}}", event.username.as_deref().unwrap_or("")),
        ("{{peer_addr}}", event.peer_addr.as_deref().unwrap_or("")),
        ("{{topic}}", event.topic.as_deref().unwrap_or("")),
        ("{{payload}}", event.payload.as_deref().unwrap_or("")),
        ("{{reason}}", event.reason.as_deref().unwrap_or("")),
    ];

    let mut rendered = template.to_string();
    for (placeholder, value) in substitutions {
        if rendered.contains(placeholder) {
            rendered = rendered.replace(placeholder, value);
        }
    }
    // Timestamp is rendered in RFC 3339 like the default serialization.
    if rendered.contains("{{timestamp}}") {
        rendered = rendered.replace("{{timestamp}}", &event.timestamp.to_rfc3339());
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> BrokerEvent {
        BrokerEvent::new("publish")
            .with_client("client-9", "bob")
            .with_topic("devices/9/state")
    }

    #[test]
    fn template_substitutes_known_placeholders() {
        let body = render_payload(
            Some(r#"{"who":"{{username}}","where":"{{topic}}"}"#),
            &sample_event(),
        );
        assert_eq!(body, r#"{"who":"bob","where":"devices/9/state"}"#);
    }

    #[test]
    fn missing_fields_render_empty() {
        let body = render_payload(Some("reason={{reason}}"), &sample_event());
        assert_eq!(body, "reason=");
    }

    #[test]
    fn no_template_serializes_the_event() {
        let body = render_payload(None, &sample_event());
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["event_type"], "publish");
        assert_eq!(value["username"], "bob");
    }

    #[test]
    fn unknown_placeholders_pass_through() {
        let body = render_payload(Some("x={{nope}}"), &sample_event());
        assert_eq!(body, "x={{nope}}");
    }
}
