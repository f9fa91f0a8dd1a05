//! Receipt document rendering.
//!
//! Producing PDFs is the job of an external template engine; the ledger
//! only assembles the data and hands it to a [`TemplateRenderer`].

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{LedgerError, Result};

/// Template used for printable payment receipts.
pub const RECEIPT_TEMPLATE: &str = "payment-receipt";

/// Output of a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// File extension (without dot) used for the download name.
    pub extension: String,
}

#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    async fn render(&self, template_name: &str, data: &Value) -> Result<RenderedDocument>;
}

/// Plain-text receipt renderer used when no document engine is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReceiptRenderer;

fn field<'a>(data: &'a Value, path: &[&str]) -> Result<&'a Value> {
    let mut current = data;
    for key in path {
        current = current
            .get(key)
            .ok_or_else(|| LedgerError::Render(format!("missing field '{}'", path.join("."))))?;
    }
    Ok(current)
}

fn text(data: &Value, path: &[&str]) -> Result<String> {
    match field(data, path)? {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

#[async_trait]
impl TemplateRenderer for TextReceiptRenderer {
    async fn render(&self, template_name: &str, data: &Value) -> Result<RenderedDocument> {
        if template_name != RECEIPT_TEMPLATE {
            return Err(LedgerError::Render(format!(
                "unknown template '{}'",
                template_name
            )));
        }

        let rule = "-".repeat(48);
        let lines = [
            text(data, &["school", "name"])?,
            text(data, &["school", "address"])?,
            format!(
                "Phone: {}  Email: {}",
                text(data, &["school", "phone"])?,
                text(data, &["school", "email"])?
            ),
            rule.clone(),
            "PAYMENT RECEIPT".to_string(),
            format!("Invoice No: {}", text(data, &["invoice_no"])?),
            format!("Date:       {}", text(data, &["date"])?),
            rule.clone(),
            format!("Student:    {}", text(data, &["student", "name"])?),
            format!("Student ID: {}", text(data, &["student", "id"])?),
            format!(
                "Class:      {} ({})",
                text(data, &["student", "class"])?,
                text(data, &["student", "section"])?
            ),
            format!(
                "Period:     {}-{:0>2}",
                text(data, &["year"])?,
                text(data, &["month"])?
            ),
            rule.clone(),
            format!("Amount:     {}", text(data, &["amount"])?),
            format!("Method:     {}", text(data, &["payment_method"])?),
            format!("Status:     {}", text(data, &["status"])?.to_uppercase()),
            rule,
        ];

        let mut body = lines.join("\n");
        body.push('\n');

        Ok(RenderedDocument {
            bytes: body.into_bytes(),
            content_type: "text/plain; charset=utf-8".to_string(),
            extension: "txt".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn receipt_data() -> Value {
        json!({
            "id": 42,
            "invoice_no": "INV-000042",
            "date": "2024-03-05",
            "amount": "400",
            "payment_method": "bank",
            "status": "paid",
            "student": { "name": "Rahim Uddin", "id": "MB-0001", "class": "Class Five", "section": "A" },
            "year": 2024,
            "month": 3,
            "school": {
                "name": "Mousumi Biddyaniketan",
                "address": "Ukilpara, Naogaon",
                "logo": "/logo.png",
                "phone": "+880-XXX-XXXXXX",
                "email": "mbnbd@gmail.com"
            }
        })
    }

    #[tokio::test]
    async fn renders_receipt_fields() {
        let doc = TextReceiptRenderer
            .render(RECEIPT_TEMPLATE, &receipt_data())
            .await
            .unwrap();
        let body = String::from_utf8(doc.bytes).unwrap();

        assert!(body.contains("Mousumi Biddyaniketan"));
        assert!(body.contains("Invoice No: INV-000042"));
        assert!(body.contains("Student ID: MB-0001"));
        assert!(body.contains("Period:     2024-03"));
        assert!(body.contains("Status:     PAID"));
        assert_eq!(doc.extension, "txt");
    }

    #[tokio::test]
    async fn unknown_template_is_a_render_error() {
        let result = TextReceiptRenderer.render("salary-slip", &receipt_data()).await;
        assert!(matches!(result, Err(LedgerError::Render(_))));
    }

    #[tokio::test]
    async fn missing_field_is_a_render_error() {
        let result = TextReceiptRenderer.render(RECEIPT_TEMPLATE, &json!({})).await;
        assert!(matches!(result, Err(LedgerError::Render(_))));
    }
}
