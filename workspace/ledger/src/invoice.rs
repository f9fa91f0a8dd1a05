//! Invoice/Receipt Generator: turns a stored payment into something a
//! person can read, print or download.

use common::{InvoiceStudent, InvoiceView, Period, SchoolInfo};
use sea_orm::ConnectionTrait;
use tracing::{debug, instrument, warn};

use crate::error::{LedgerError, Result};
use crate::render::{RECEIPT_TEMPLATE, TemplateRenderer};
use crate::roster;
use crate::storage::{FileStorage, reference_extension};
use crate::store;

/// A downloadable file with the name it should be saved under.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub fn invoice_number(payment_id: i32) -> String {
    format!("INV-{:06}", payment_id)
}

/// `Receipt-{student_code}-{year}-{month}.{extension}`
pub fn receipt_filename(student_code: &str, period: Period, extension: &str) -> String {
    format!(
        "Receipt-{}-{}-{}.{}",
        student_code, period.year, period.month, extension
    )
}

fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[instrument(skip(conn, school))]
pub async fn build_invoice<C: ConnectionTrait>(
    conn: &C,
    payment_id: i32,
    school: &SchoolInfo,
) -> Result<InvoiceView> {
    let payment = store::find_payment_by_id(conn, payment_id).await?;
    let record = roster::get_student_record(conn, payment.student_id).await?;

    Ok(InvoiceView {
        id: payment.id,
        invoice_no: invoice_number(payment.id),
        date: payment.created_at.format("%Y-%m-%d").to_string(),
        amount: payment.amount,
        payment_method: payment.payment_method.as_str().to_string(),
        status: "paid".to_string(),
        student: InvoiceStudent {
            name: record.student.name,
            id: record.student.student_code,
            class: record.class_name,
            section: record.section_name,
        },
        year: payment.year,
        month: payment.month as u32,
        school: school.clone(),
    })
}

/// Fetches the stored proof of a payment. A payment without a proof, or
/// whose proof has gone missing from storage, is `NotFound`.
#[instrument(skip(conn, storage))]
pub async fn download_receipt<C: ConnectionTrait>(
    conn: &C,
    storage: &dyn FileStorage,
    payment_id: i32,
) -> Result<ReceiptFile> {
    let payment = store::find_payment_by_id(conn, payment_id).await?;
    let reference = payment
        .receipt
        .clone()
        .ok_or_else(|| LedgerError::not_found("receipt for payment", payment_id))?;

    if !storage.exists(&reference).await? {
        warn!(
            "Receipt {} for payment {} (student {}, {}-{:02}) is missing from storage",
            reference, payment.id, payment.student_id, payment.year, payment.month
        );
        return Err(LedgerError::not_found("receipt file", reference));
    }

    let student = roster::get_student(conn, payment.student_id).await?;
    let extension = reference_extension(&reference).unwrap_or("bin").to_ascii_lowercase();
    let bytes = match storage.download(&reference).await {
        Ok(bytes) => bytes,
        Err(e) if !storage.exists(&reference).await.unwrap_or(true) => {
            warn!("Receipt {} vanished before it could be read: {}", reference, e);
            return Err(LedgerError::not_found("receipt file", reference));
        }
        Err(e) => return Err(e),
    };
    debug!("Serving receipt {} ({} bytes)", reference, bytes.len());

    Ok(ReceiptFile {
        file_name: receipt_filename(
            &student.student_code,
            Period::new(payment.year, payment.month as u32),
            &extension,
        ),
        content_type: content_type_for(&extension).to_string(),
        bytes,
    })
}

/// Renders a printable receipt through `renderer`.
#[instrument(skip(conn, renderer, school))]
pub async fn render_receipt<C: ConnectionTrait>(
    conn: &C,
    renderer: &dyn TemplateRenderer,
    payment_id: i32,
    school: &SchoolInfo,
) -> Result<ReceiptFile> {
    let invoice = build_invoice(conn, payment_id, school).await?;
    let data = serde_json::to_value(&invoice)
        .map_err(|e| LedgerError::Render(format!("failed to serialize invoice: {}", e)))?;
    let document = renderer.render(RECEIPT_TEMPLATE, &data).await?;

    Ok(ReceiptFile {
        file_name: receipt_filename(
            &invoice.student.id,
            Period::new(invoice.year, invoice.month),
            &document.extension,
        ),
        content_type: document.content_type,
        bytes: document.bytes,
    })
}
