use rust_decimal::Decimal;

use crate::domain::quotation::Quotation;
use crate::pricing::evaluate_line;
use crate::share::money::format_inr;
use crate::share::ShareContext;

const RULE: &str = "═══════════════════════════════════";

/// Itemised WhatsApp message with the full financial breakdown.
pub fn full_detail_message(quotation: &Quotation, ctx: &ShareContext<'_>) -> String {
    let client = &quotation.client;
    let totals = &quotation.totals;
    let company = ctx.company;

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("🏢 *{}*", company.name.to_uppercase()));
    match (company.tagline.is_empty(), company.phone.is_empty()) {
        (false, false) => lines.push(format!("{} | Ph: {}", company.tagline, company.phone)),
        (false, true) => lines.push(company.tagline.clone()),
        (true, false) => lines.push(format!("Ph: {}", company.phone)),
        (true, true) => {}
    }
    lines.push(RULE.to_string());
    lines.push(String::new());

    lines.push("📋 *QUOTATION*".to_string());
    lines.push(format!("Quotation #: {}", or_na(ctx.quote_number)));
    lines.push(format!("Date: {}", ctx.date));
    lines.push(String::new());

    lines.push("👤 *CLIENT INFORMATION*".to_string());
    lines.push(format!("Name: {}", client.name().unwrap_or("N/A")));
    push_field(&mut lines, "Mobile: ", client.mobile());
    push_field(&mut lines, "Email: ", client.email());
    push_field(&mut lines, "Company: ", client.company());
    push_field(&mut lines, "Address: ", client.address());
    push_field(&mut lines, "GSTIN: ", client.gstin());
    lines.push(String::new());

    lines.push("📦 *ITEMS*".to_string());
    for (index, item) in quotation.items.iter().enumerate() {
        let line = evaluate_line(item);
        lines.push(format!(
            "  {}. {} ({}x) → ₹{} | Disc: {}% | Total: ₹{}",
            index + 1,
            item.display_name(index),
            line.quantity,
            format_inr(line.price),
            percent(line.discount_percent),
            format_inr(line.total)
        ));
    }
    lines.push(String::new());

    lines.push("💰 *FINANCIAL BREAKDOWN*".to_string());
    lines.push(format!("Subtotal: ₹{}", format_inr(totals.subtotal)));
    if totals.discount_amount > Decimal::ZERO {
        lines.push(format!(
            "Discount ({}%): -₹{}",
            percent(quotation.discount_percent),
            format_inr(totals.discount_amount)
        ));
    }
    lines.push(format!("Taxable Amount: ₹{}", format_inr(totals.taxable_amount)));
    if totals.gst_amount > Decimal::ZERO {
        lines.push(format!(
            "GST ({}%): +₹{}",
            percent(quotation.gst_rate),
            format_inr(totals.gst_amount)
        ));
    }
    lines.push(String::new());
    lines.push(format!("*🎯 GRAND TOTAL: ₹{}*", format_inr(totals.grand_total)));
    lines.push(String::new());

    if !ctx.document_link.is_empty() {
        lines.push(format!("📄 PDF: {}", ctx.document_link));
        lines.push(String::new());
    }
    lines.push("Thank you! 🙏".to_string());
    if !company.website.is_empty() {
        lines.push(company.website.clone());
    }

    lines.join("\n")
}

/// Short note pointing at the published document.
pub fn link_only_message(quotation: &Quotation, ctx: &ShareContext<'_>) -> String {
    [
        "📄 *PDF QUOTATION*".to_string(),
        String::new(),
        format!("Quotation: {}", or_na(ctx.quote_number)),
        format!("Date: {}", ctx.date),
        format!("Client: {}", quotation.client_label()),
        format!("Total: ₹{}", format_inr(quotation.totals.grand_total)),
        String::new(),
        "📥 Download PDF:".to_string(),
        ctx.document_link.to_string(),
    ]
    .join("\n")
}

pub fn email_subject(ctx: &ShareContext<'_>) -> String {
    format!("Quotation {} — {}", or_na(ctx.quote_number), ctx.company.name)
}

/// Plain-text email body with aligned labels and a signature block.
pub fn email_body(quotation: &Quotation, ctx: &ShareContext<'_>) -> String {
    let client = &quotation.client;
    let totals = &quotation.totals;
    let company = ctx.company;

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("Dear {},", quotation.client_label()));
    lines.push(String::new());
    if company.tagline.is_empty() {
        lines.push(format!("Thank you for your interest in {}.", company.name));
    } else {
        lines.push(format!("Thank you for your interest in {} — {}.", company.name, company.tagline));
    }
    lines.push(String::new());
    lines.push("Please find your quotation details below:".to_string());
    lines.push(String::new());

    lines.push(format!("Quotation No : {}", or_na(ctx.quote_number)));
    lines.push(format!("Date         : {}", ctx.date));
    push_field(&mut lines, "Company      : ", client.company());
    push_field(&mut lines, "Address      : ", client.address());
    push_field(&mut lines, "GSTIN        : ", client.gstin());
    lines.push(String::new());

    lines.push("Items:".to_string());
    for (index, item) in quotation.items.iter().enumerate() {
        let line = evaluate_line(item);
        lines.push(format!(
            "{}. {} | Qty: {} | Rs {} | Disc: {}% | Total: Rs {}",
            index + 1,
            item.display_name(index),
            line.quantity,
            format_inr(line.price),
            percent(line.discount_percent),
            format_inr(line.total)
        ));
    }
    lines.push(String::new());

    lines.push(format!("Subtotal      : Rs {}", format_inr(totals.subtotal)));
    if totals.discount_amount > Decimal::ZERO {
        lines.push(format!(
            "Discount ({}%) : -Rs {}",
            percent(quotation.discount_percent),
            format_inr(totals.discount_amount)
        ));
    }
    lines.push(format!("Taxable Amount: Rs {}", format_inr(totals.taxable_amount)));
    if totals.gst_amount > Decimal::ZERO {
        lines.push(format!(
            "GST ({}%)    : +Rs {}",
            percent(quotation.gst_rate),
            format_inr(totals.gst_amount)
        ));
    }
    lines.push(format!("Grand Total   : Rs {}", format_inr(totals.grand_total)));
    lines.push(String::new());

    if !ctx.document_link.is_empty() {
        lines.push(format!("Download PDF: {}", ctx.document_link));
        lines.push(String::new());
    }

    let contact: Vec<String> = [
        ("Phone : ", company.phone.as_str()),
        ("Email : ", company.email.as_str()),
        ("Web   : ", company.website.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(label, value)| format!("{label}{value}"))
    .collect();
    if !contact.is_empty() {
        lines.push("For any queries, contact us at:".to_string());
        lines.extend(contact);
        lines.push(String::new());
    }

    lines.push("Warm regards,".to_string());
    lines.push(format!("{} Team", company.name));

    lines.join("\n")
}

fn push_field(lines: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        lines.push(format!("{label}{value}"));
    }
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

fn percent(value: Decimal) -> String {
    value.normalize().to_string()
}
