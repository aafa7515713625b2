//! Email templates
//!
//! Templates are addressed by id; their data is the JSON object published
//! alongside the message.

use crate::error::{NotifyError, NotifyResult};

pub const USER_INVITATION_TEMPLATE: &str = "user_invitation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

pub fn render(template_id: &str, data: &serde_json::Value) -> NotifyResult<RenderedEmail> {
    match template_id {
        USER_INVITATION_TEMPLATE => render_invitation(data),
        other => Err(NotifyError::UnknownTemplate(other.to_string())),
    }
}

fn field<'a>(
    data: &'a serde_json::Value,
    template: &'static str,
    field: &'static str,
) -> NotifyResult<&'a str> {
    data.get(field)
        .and_then(|v| v.as_str())
        .ok_or(NotifyError::MissingField { template, field })
}

fn render_invitation(data: &serde_json::Value) -> NotifyResult<RenderedEmail> {
    let username = field(data, USER_INVITATION_TEMPLATE, "username")?;
    let activation_url = field(data, USER_INVITATION_TEMPLATE, "activation_url")?;

    Ok(RenderedEmail {
        subject: "Finish your registration".to_string(),
        html: format!(
            "<!doctype html>\
             <html><body>\
             <p>Hi {username},</p>\
             <p>Thanks for signing up. Confirm your email address to activate your account:</p>\
             <p><a href=\"{activation_url}\">{activation_url}</a></p>\
             <p>The link expires in 24 hours. If you did not sign up, ignore this email.</p>\
             </body></html>",
            username = escape_html(username),
            activation_url = escape_html(activation_url),
        ),
    })
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
