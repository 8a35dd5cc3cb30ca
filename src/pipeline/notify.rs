// src/pipeline/notify.rs
//! Notification dispatcher: renders candidate-facing emails and hands them to
//! the SES collaborator. Delivery failure is reported to the caller but never
//! aborts the surrounding business operation.

use std::sync::Arc;
use tracing::{info, warn};

use super::{InviteKind, PipelineError};
use crate::common::helpers::safe_email_log;
use crate::pipeline::stage::Stage;
use crate::services::AwsService;

/// A candidate-facing message template. Subject and body may contain
/// `{name}` and `{job_title}` placeholders.
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub enum Notification {
    /// MCQ test invite carrying the access link
    TestInvite { link: String },
    /// Async interview invite carrying the access link
    InterviewInvite { link: String },
    Rejection,
    StageUpdate { stage: Stage },
    /// HR-authored message; subject/body may carry placeholders
    Custom { subject: String, body: String },
}

/// Substitute `{name}` and `{job_title}` placeholders in a template string
pub fn substitute(template: &str, candidate_name: &str, job_title: &str) -> String {
    template
        .replace("{name}", candidate_name)
        .replace("{job_title}", job_title)
}

fn wrap_html(heading: &str, heading_color: &str, inner: &str) -> String {
    format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: {};">{}</h2>
        {}
        <p>Best regards,<br>The Hiring Team</p>
    </div>
</body>
</html>"#,
        heading_color, heading, inner
    )
}

/// Build the template for a notification kind, placeholders unresolved
pub fn template_for(notification: &Notification) -> EmailTemplate {
    match notification {
        Notification::TestInvite { link } => EmailTemplate {
            subject: "Online Assessment Invitation - {job_title}".to_string(),
            body: wrap_html(
                "Online Assessment Invitation",
                "#4F46E5",
                &format!(
                    r#"<p>Dear {{name}},</p>
        <p>Thank you for applying for the <strong>{{job_title}}</strong> position. As the next step, we invite you to complete a short online assessment.</p>
        <p><a href="{}" style="display: inline-block; padding: 12px 24px; background-color: #4F46E5; color: white; text-decoration: none; border-radius: 5px;">Start Assessment</a></p>
        <p>This link is personal to you; please do not share it.</p>"#,
                    link
                ),
            ),
        },
        Notification::InterviewInvite { link } => EmailTemplate {
            subject: "Video Interview Invitation - {job_title}".to_string(),
            body: wrap_html(
                "Video Interview Invitation",
                "#4F46E5",
                &format!(
                    r#"<p>Dear {{name}},</p>
        <p>Congratulations! You have progressed to the interview stage for the <strong>{{job_title}}</strong> position.</p>
        <p>Please record your responses at your convenience using the link below.</p>
        <p><a href="{}" style="display: inline-block; padding: 12px 24px; background-color: #4F46E5; color: white; text-decoration: none; border-radius: 5px;">Start Interview</a></p>
        <p>This link is personal to you; please do not share it.</p>"#,
                    link
                ),
            ),
        },
        Notification::Rejection => EmailTemplate {
            subject: "Application Status Update - {job_title}".to_string(),
            body: wrap_html(
                "Application Status Update",
                "#6B7280",
                r#"<p>Dear {name},</p>
        <p>Thank you for your interest in the <strong>{job_title}</strong> position and for taking the time to apply.</p>
        <p>After careful consideration, we have decided to move forward with other candidates whose qualifications more closely match our current needs.</p>
        <p>We encourage you to apply for future opportunities that match your skills and experience.</p>"#,
            ),
        },
        Notification::StageUpdate { stage } => {
            let (subject, heading, color, line) = match stage {
                Stage::Offer => (
                    "Job Offer - {job_title}",
                    "Congratulations! Job Offer",
                    "#10B981",
                    "<p>We are delighted to offer you the <strong>{job_title}</strong> position! A formal offer letter with full details will follow shortly.</p>",
                ),
                Stage::Hired => (
                    "Welcome Aboard - {job_title}",
                    "Welcome Aboard!",
                    "#10B981",
                    "<p>Welcome to the team! We are thrilled to have you join us as <strong>{job_title}</strong>. Onboarding details will follow.</p>",
                ),
                _ => (
                    "Application Update - {job_title}",
                    "Application Status Update",
                    "#4F46E5",
                    "<p>Good news! Your application for the <strong>{job_title}</strong> position has moved to the next stage of our process. We will be in touch with details shortly.</p>",
                ),
            };
            EmailTemplate {
                subject: subject.to_string(),
                body: wrap_html(
                    heading,
                    color,
                    &format!("<p>Dear {{name}},</p>\n        {}", line),
                ),
            }
        }
        Notification::Custom { subject, body } => EmailTemplate {
            subject: subject.clone(),
            body: wrap_html(
                "A Message About Your Application",
                "#4F46E5",
                &format!("<p>Dear {{name}},</p>\n        <p>{}</p>", body),
            ),
        },
    }
}

/// Render a notification for a specific candidate and job
pub fn render(notification: &Notification, candidate_name: &str, job_title: &str) -> EmailTemplate {
    let template = template_for(notification);
    EmailTemplate {
        subject: substitute(&template.subject, candidate_name, job_title),
        body: substitute(&template.body, candidate_name, job_title),
    }
}

/// Hands rendered messages to the external email collaborator
#[derive(Clone)]
pub struct NotificationDispatcher {
    aws_service: Arc<AwsService>,
}

impl NotificationDispatcher {
    pub fn new(aws_service: Arc<AwsService>) -> Self {
        Self { aws_service }
    }

    /// Render and send one notification. A delivery failure is returned to
    /// the caller for per-item accounting, never propagated as a panic or a
    /// batch abort.
    pub async fn send(
        &self,
        application_id: &str,
        to: &str,
        notification: &Notification,
        candidate_name: &str,
        job_title: &str,
    ) -> Result<(), PipelineError> {
        let rendered = render(notification, candidate_name, job_title);

        match self
            .aws_service
            .send_email(vec![to.to_string()], &rendered.subject, &rendered.body)
            .await
        {
            Ok(()) => {
                info!(
                    application_id = %application_id,
                    to = %safe_email_log(to),
                    subject = %rendered.subject,
                    "Notification sent"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    application_id = %application_id,
                    to = %safe_email_log(to),
                    error = %e,
                    "Notification delivery failed"
                );
                Err(PipelineError::Email(e.to_string()))
            }
        }
    }
}

/// Candidate access link for an invite kind
pub fn invite_link(base_url: &str, kind: InviteKind, token: &str) -> String {
    match kind {
        InviteKind::Test => format!("{}/candidate/test/{}", base_url, token),
        InviteKind::Interview => format!("{}/candidate/interview/{}", base_url, token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_replaces_both_placeholders() {
        let out = substitute(
            "Dear {name}, about the {job_title} role ({job_title})",
            "Ada",
            "Compiler Engineer",
        );
        assert_eq!(
            out,
            "Dear Ada, about the Compiler Engineer role (Compiler Engineer)"
        );
    }

    #[test]
    fn test_render_rejection() {
        let rendered = render(&Notification::Rejection, "Ada", "Compiler Engineer");
        assert_eq!(
            rendered.subject,
            "Application Status Update - Compiler Engineer"
        );
        assert!(rendered.body.contains("Dear Ada,"));
        assert!(rendered.body.contains("<strong>Compiler Engineer</strong>"));
        assert!(!rendered.body.contains("{name}"));
        assert!(!rendered.body.contains("{job_title}"));
    }

    #[test]
    fn test_render_test_invite_contains_link() {
        let link = invite_link("https://jobs.example.com", InviteKind::Test, "tok123");
        let rendered = render(&Notification::TestInvite { link: link.clone() }, "Ada", "Engineer");
        assert!(rendered.body.contains(&link));
        assert_eq!(link, "https://jobs.example.com/candidate/test/tok123");
    }

    #[test]
    fn test_render_custom_keeps_hr_placeholders() {
        let rendered = render(
            &Notification::Custom {
                subject: "Update for {name}".to_string(),
                body: "We reviewed your application for {job_title}.".to_string(),
            },
            "Ada",
            "Engineer",
        );
        assert_eq!(rendered.subject, "Update for Ada");
        assert!(rendered.body.contains("We reviewed your application for Engineer."));
    }

    #[test]
    fn test_stage_update_offer_template() {
        let rendered = render(
            &Notification::StageUpdate { stage: Stage::Offer },
            "Ada",
            "Engineer",
        );
        assert_eq!(rendered.subject, "Job Offer - Engineer");
        assert!(rendered.body.contains("offer you"));
    }
}
