use crate::format::{
    DEFAULT_CURRENCY, format_currency, format_date, sanitize_string, validate_email, value_number,
    value_text,
};
use crate::models::{Cell, DisplayRow};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Upstream entity types, in sync order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Affiliates,
    Referrals,
    Coupons,
    Payments,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Affiliates,
        ResourceKind::Referrals,
        ResourceKind::Coupons,
        ResourceKind::Payments,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Affiliates => "affiliates",
            ResourceKind::Referrals => "referrals",
            ResourceKind::Coupons => "coupons",
            ResourceKind::Payments => "payments",
        }
    }

    pub fn sheet_name(self) -> &'static str {
        match self {
            ResourceKind::Affiliates => "Affiliates",
            ResourceKind::Referrals => "Referrals",
            ResourceKind::Coupons => "Coupons",
            ResourceKind::Payments => "Payments",
        }
    }

    pub fn headers(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Affiliates => &[
                "ID",
                "First Name",
                "Last Name",
                "Email",
                "State",
                "Referral Token",
                "Visitors",
                "Leads",
                "Conversions",
                "Created At",
            ],
            ResourceKind::Referrals => &[
                "ID",
                "Affiliate ID",
                "Affiliate Email",
                "Customer Email",
                "Status",
                "Amount",
                "Currency",
                "Created At",
                "Converted At",
            ],
            ResourceKind::Coupons => &[
                "ID",
                "Code",
                "Affiliate ID",
                "Affiliate Email",
                "Discount",
                "Uses",
                "Created At",
            ],
            ResourceKind::Payments => &[
                "ID",
                "Affiliate ID",
                "Affiliate Email",
                "Amount",
                "Currency",
                "State",
                "Paid At",
                "Created At",
            ],
        }
    }

    fn projection(self) -> fn(&Value) -> DisplayRow {
        match self {
            ResourceKind::Affiliates => project_affiliate,
            ResourceKind::Referrals => project_referral,
            ResourceKind::Coupons => project_coupon,
            ResourceKind::Payments => project_payment,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resource to pull: where it lives upstream and how it lands in the sheet.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub path: String,
    pub projection: fn(&Value) -> DisplayRow,
}

impl ResourceDescriptor {
    pub fn new(kind: ResourceKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            projection: kind.projection(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn sheet_name(&self) -> &'static str {
        self.kind.sheet_name()
    }

    pub fn headers(&self) -> &'static [&'static str] {
        self.kind.headers()
    }

    pub fn project(&self, record: &Value) -> DisplayRow {
        (self.projection)(record)
    }
}

static NULL: Value = Value::Null;

/// Field lookups over an untyped record. Each pointer is tried in order.
struct Fields<'a>(&'a Value);

impl Fields<'_> {
    fn lookup(&self, pointers: &[&str]) -> &Value {
        pointers
            .iter()
            .filter_map(|pointer| self.0.pointer(pointer))
            .find(|value| !value.is_null())
            .unwrap_or(&NULL)
    }

    fn text(&self, pointers: &[&str]) -> Cell {
        let raw = value_text(self.lookup(pointers));
        Cell::Text(sanitize_string(raw.as_deref()))
    }

    fn email(&self, pointers: &[&str]) -> Cell {
        let email = sanitize_string(value_text(self.lookup(pointers)).as_deref());
        if !email.is_empty() && !validate_email(&email) {
            debug!(email = %email, "Record has malformed email");
        }
        Cell::Text(email)
    }

    fn date(&self, pointers: &[&str]) -> Cell {
        let raw = value_text(self.lookup(pointers));
        Cell::Text(format_date(raw.as_deref()))
    }

    fn number(&self, pointers: &[&str]) -> Cell {
        Cell::Number(value_number(self.lookup(pointers)))
    }

    fn currency_code(&self) -> String {
        let code = sanitize_string(value_text(self.lookup(&["/currency"])).as_deref());
        match code.is_empty() {
            true => DEFAULT_CURRENCY.to_string(),
            false => code.to_uppercase(),
        }
    }

    fn amount(&self, pointers: &[&str]) -> Cell {
        Cell::Text(format_currency(self.lookup(pointers), &self.currency_code()))
    }
}

const AFFILIATE_ID: &[&str] = &["/affiliate/id", "/affiliate_id"];
const AFFILIATE_EMAIL: &[&str] = &["/affiliate/email", "/affiliate_email"];

fn project_affiliate(record: &Value) -> DisplayRow {
    let f = Fields(record);
    vec![
        f.text(&["/id"]),
        f.text(&["/first_name"]),
        f.text(&["/last_name"]),
        f.email(&["/email"]),
        f.text(&["/state", "/status"]),
        f.text(&["/referral_token", "/token", "/links/0/token"]),
        f.number(&["/visitors"]),
        f.number(&["/leads"]),
        f.number(&["/conversions"]),
        f.date(&["/created_at"]),
    ]
}

fn project_referral(record: &Value) -> DisplayRow {
    let f = Fields(record);
    vec![
        f.text(&["/id"]),
        f.text(AFFILIATE_ID),
        f.email(AFFILIATE_EMAIL),
        f.email(&["/customer/email", "/customer_email"]),
        f.text(&["/status", "/conversion_state", "/state"]),
        f.amount(&["/amount"]),
        Cell::Text(f.currency_code()),
        f.date(&["/created_at"]),
        f.date(&["/converted_at"]),
    ]
}

fn project_coupon(record: &Value) -> DisplayRow {
    let f = Fields(record);
    vec![
        f.text(&["/id"]),
        f.text(&["/code", "/token"]),
        f.text(AFFILIATE_ID),
        f.email(AFFILIATE_EMAIL),
        f.text(&["/discount", "/discount_amount"]),
        f.number(&["/uses", "/redemptions"]),
        f.date(&["/created_at"]),
    ]
}

fn project_payment(record: &Value) -> DisplayRow {
    let f = Fields(record);
    vec![
        f.text(&["/id"]),
        f.text(AFFILIATE_ID),
        f.email(AFFILIATE_EMAIL),
        f.amount(&["/amount"]),
        Cell::Text(f.currency_code()),
        f.text(&["/state", "/status"]),
        f.date(&["/paid_at"]),
        f.date(&["/created_at"]),
    ]
}
