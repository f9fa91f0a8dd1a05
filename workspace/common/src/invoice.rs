use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Institution details printed on invoices and receipts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SchoolInfo {
    pub name: String,
    pub address: String,
    pub logo: String,
    pub phone: String,
    pub email: String,
}

/// Student block of an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceStudent {
    pub name: String,
    /// The school-issued student code
    pub id: String,
    pub class: String,
    pub section: String,
}

/// Render-ready, fully denormalized view of one payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceView {
    pub id: i32,
    /// e.g. "INV-000042"
    pub invoice_no: String,
    /// `YYYY-MM-DD`
    pub date: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub payment_method: String,
    pub status: String,
    pub student: InvoiceStudent,
    pub year: i32,
    pub month: u32,
    pub school: SchoolInfo,
}
