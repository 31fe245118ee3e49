/// Email templates for the messages Surveyor sends
use super::{send_email_with, EmailResult};
use crate::app_config::EmailConfig;

/// Plain text and HTML bodies of the one-time code email.
pub fn otp_bodies(site_name: &str, username: &str, code: &str, minutes: i64) -> (String, String) {
    let body_text = format!(
        r#"Hello {},

Your verification code is: {}

Enter it on the verification page to finish creating your account.
The code expires in {} minutes.

---
{}
"#,
        username, code, minutes, site_name
    );

    let body_html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Verification Code</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2>Welcome to {}!</h2>
        <p>Hello <strong>{}</strong>,</p>
        <p>Enter this code on the verification page to finish creating your account:</p>
        <p style="margin: 30px 0; font-size: 2em; letter-spacing: 0.3em; font-weight: bold;">{}</p>
        <p><strong>This code will expire in {} minutes.</strong></p>
        <hr style="margin: 30px 0; border: none; border-top: 1px solid #ddd;">
        <p style="color: #666; font-size: 0.9em;">
            If you did not create an account, please ignore this email.
        </p>
    </div>
</body>
</html>"#,
        site_name, username, code, minutes
    );

    (body_text, body_html)
}

/// Send the registration one-time code
pub async fn send_otp_email(
    config: &EmailConfig,
    site_name: &str,
    to: &str,
    username: &str,
    code: &str,
    lifetime_seconds: i64,
) -> EmailResult<()> {
    let minutes = (lifetime_seconds + 59) / 60;
    let (body_text, body_html) = otp_bodies(site_name, username, code, minutes);

    send_email_with(
        config,
        to,
        &format!("Your {} verification code", site_name),
        &body_text,
        Some(&body_html),
    )
    .await
}
