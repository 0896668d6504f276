// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production email dispatch over `lettre`'s async SMTP transport.

use super::{DeliveryResult, EmailDispatcher, EmailError, MatchBatch, ProgressUpdate, RunSummary};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use scanctl_core::Subscriber;

#[derive(Clone)]
pub struct SmtpEmailDispatcher {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpEmailDispatcher {
    pub fn new(transport: AsyncSmtpTransport<Tokio1Executor>, from: impl Into<String>) -> Self {
        Self {
            transport,
            from: from.into(),
        }
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<DeliveryResult, EmailError> {
        let message = Message::builder()
            .from(self.from.parse().map_err(|e| EmailError::DeliveryFailed(format!("{e}")))?)
            .to(to.parse().map_err(|e| EmailError::DeliveryFailed(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| EmailError::DeliveryFailed(e.to_string()))?;

        match self.transport.send(message).await {
            Ok(_) => Ok(DeliveryResult {
                accepted: true,
                detail: None,
            }),
            Err(e) => Ok(DeliveryResult {
                accepted: false,
                detail: Some(e.to_string()),
            }),
        }
    }
}

#[async_trait]
impl EmailDispatcher for SmtpEmailDispatcher {
    async fn send_batch(
        &self,
        subscriber: &Subscriber,
        batch: &MatchBatch,
    ) -> Result<DeliveryResult, EmailError> {
        let mut body = format!(
            "<h2>{} new document match(es)</h2><ul>",
            batch.matches.len()
        );
        for m in &batch.matches {
            let quote: String = m.validation_quote.chars().take(280).collect();
            body.push_str(&format!(
                "<li><b>{}</b> ({}) — project {}<br><i>\"{}\"</i></li>",
                m.file_name, m.fi_type, m.project_id, quote
            ));
        }
        body.push_str("</ul>");

        self.send(
            &subscriber.email,
            &format!("New planning document matches ({} type(s))", batch.report_types.len()),
            body,
        )
        .await
    }

    async fn send_progress(
        &self,
        admin_addr: &str,
        update: &ProgressUpdate,
    ) -> Result<DeliveryResult, EmailError> {
        let body = format!(
            "<p>{}: {}/{} processed, {} matches so far.</p>",
            update.job_name, update.processed, update.total, update.matches_found
        );
        self.send(admin_addr, &format!("Scan progress: {}", update.job_name), body)
            .await
    }

    async fn send_summary(
        &self,
        admin_addr: &str,
        summary: &RunSummary,
    ) -> Result<DeliveryResult, EmailError> {
        let body = format!(
            "<p>{} complete: {}/{} processed, {} matches, {} delivery failures.</p>",
            summary.job_name,
            summary.processed,
            summary.total,
            summary.matches_found,
            summary.failed_deliveries
        );
        self.send(admin_addr, &format!("Scan summary: {}", summary.job_name), body)
            .await
    }
}
