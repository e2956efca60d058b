use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::model::Subscription;

pub const CSV_FILENAME: &str = "newsletter_subscriptions.csv";
const CSV_HEADER: [&str; 4] = ["Email", "Active", "Subscribed At", "IP Address"];

/// CSV attachment with the selected subscriptions.
pub fn csv_response(subscriptions: &[Subscription]) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{CSV_FILENAME}\""),
            ),
        ],
        to_csv(subscriptions),
    )
        .into_response()
}

pub fn to_csv(subscriptions: &[Subscription]) -> String {
    let mut out = String::new();
    push_record(&mut out, CSV_HEADER);

    for sub in subscriptions {
        let subscribed_at = sub.subscribed_at.format("%Y-%m-%d %H:%M:%S").to_string();
        push_record(
            &mut out,
            [
                sub.email.as_str(),
                if sub.is_active { "Yes" } else { "No" },
                subscribed_at.as_str(),
                sub.ip_address.as_deref().unwrap_or("N/A"),
            ],
        );
    }

    out
}

fn push_record<const N: usize>(out: &mut String, fields: [&str; N]) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push_str("\r\n");
}

/// Quotes fields containing separators, quotes or line breaks, doubling inner quotes.
fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}
