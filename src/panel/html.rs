// src/panel/html.rs
//! `PanelView → HTML`. Every string that came from a user or an upstream goes
//! through `html_escape` before it is written.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use super::markup::{Block, Inline};
use super::state::{BannerKind, BannerSlot, ContactForm};
use super::view::{
    BannerView, ContactOption, ContactsTableView, DealFormView, DealsModalView,
    InsightView, PanelView,
};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f5f7fa; color: #333; }
header { background: #007bff; color: #fff; padding: 16px 24px; }
main { display: grid; gap: 16px; padding: 24px; grid-template-columns: 1fr 1fr; }
section { background: #fff; border-radius: 8px; padding: 16px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
.span-2 { grid-column: 1 / -1; }
.hidden { display: none; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 8px; border-bottom: 1px solid #eee; }
.empty-message { color: #888; text-align: center; padding: 16px; }
.banner { padding: 8px 12px; border-radius: 4px; margin: 8px 0; animation: auto-hide 0s linear forwards; }
.banner.success { background: #e6f4ea; color: #1e7e34; }
.banner.error, .error { background: #fdecea; color: #b71c1c; padding: 8px 12px; border-radius: 4px; }
.loading { color: #007bff; }
form { display: flex; flex-direction: column; gap: 8px; }
.modal { position: fixed; inset: 0; background: rgba(0,0,0,.4); display: flex; align-items: center; justify-content: center; }
.modal-content { background: #fff; border-radius: 8px; padding: 24px; min-width: 360px; max-width: 640px; }
.deal-item { border-bottom: 1px solid #eee; padding: 8px 0; }
.insight h4 { color: #007bff; margin: 15px 0 8px; font-size: 1rem; }
.insight p { margin-bottom: 12px; line-height: 1.6; }
@keyframes auto-hide { to { visibility: hidden; height: 0; margin: 0; padding: 0; } }
"#;

pub fn to_html(view: &PanelView) -> String {
    let mut out = String::with_capacity(8 * 1024);
    out.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>CRM Admin Panel</title>\n<style>");
    out.push_str(STYLE);
    out.push_str("</style>\n</head>\n<body>\n<header><h1>CRM Admin Panel</h1></header>\n<main>\n");

    contacts_section(&mut out, &view.contacts);
    contact_form_section(&mut out, &view.contact_form, &view.banners);
    deal_form_section(&mut out, &view.deal_form, &view.banners);
    insight_section(&mut out, &view.insight, &view.banners);

    out.push_str("</main>\n");
    if let Some(modal) = &view.deals_modal {
        deals_modal(&mut out, modal);
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn hidden(cond: bool) -> &'static str {
    if cond {
        " hidden"
    } else {
        ""
    }
}

fn contacts_section(out: &mut String, t: &ContactsTableView) {
    out.push_str("<section id=\"contacts-panel\" class=\"span-2\">\n<h2>Contacts</h2>\n");
    out.push_str("<a id=\"load-contacts-btn\" href=\"/\">Load Contacts</a>\n");
    let _ = writeln!(
        out,
        "<div id=\"contacts-loading\" class=\"loading{}\">Loading contacts...</div>",
        hidden(!t.loading)
    );
    if let Some(err) = &t.error {
        let _ = writeln!(out, "<div id=\"contacts-error\" class=\"error\">{}</div>", text(err));
    }
    let _ = writeln!(
        out,
        "<table id=\"contacts-table\" class=\"{}\">",
        hidden(!t.visible).trim()
    );
    out.push_str("<thead><tr><th>First Name</th><th>Last Name</th><th>Email</th><th>Job Title</th><th>Company</th><th>Actions</th></tr></thead>\n<tbody id=\"contacts-tbody\">\n");
    if let Some(msg) = t.empty_message {
        let _ = writeln!(
            out,
            "<tr><td colspan=\"6\" class=\"empty-message\">{}</td></tr>",
            text(msg)
        );
    }
    for r in &t.rows {
        let _ = writeln!(
            out,
            "<tr data-contact-id=\"{id}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
<td><form method=\"get\" action=\"/\"><input type=\"hidden\" name=\"deals_for\" value=\"{id}\">\
<button class=\"action-btn view-deals-btn\" data-contact-id=\"{id}\" data-contact-name=\"{name}\">View Deals</button></form></td></tr>",
            text(&r.firstname),
            text(&r.lastname),
            text(&r.email),
            text(&r.jobtitle),
            text(&r.company),
            id = attr(&r.contact_id),
            name = attr(&r.display_name),
        );
    }
    out.push_str("</tbody>\n</table>\n</section>\n");
}

fn banners(out: &mut String, all: &[BannerView], slot: BannerSlot, id_prefix: &str) {
    for b in all.iter().filter(|b| b.slot == slot) {
        let (class, suffix) = match b.kind {
            BannerKind::Success => ("success", "success"),
            BannerKind::Error => ("error", "error"),
        };
        let ms = b.auto_hide.as_millis();
        let _ = writeln!(
            out,
            "<div id=\"{id_prefix}-{suffix}\" class=\"banner {class}\" data-auto-hide-ms=\"{ms}\" style=\"animation-delay: {ms}ms\">{}</div>",
            text(&b.message)
        );
    }
}

fn input(out: &mut String, label: &str, name: &str, kind: &str, value: &str, required: bool) {
    let _ = writeln!(
        out,
        "<label>{label}<input type=\"{kind}\" id=\"{name}\" name=\"{name}\" value=\"{}\"{}></label>",
        attr(value),
        if required { " required" } else { "" }
    );
}

fn contact_form_section(out: &mut String, v: &ContactForm, all: &[BannerView]) {
    out.push_str("<section id=\"create-contact-panel\">\n<h2>Create Contact</h2>\n");
    banners(out, all, BannerSlot::CreateContact, "create-contact");
    out.push_str("<form id=\"create-contact-form\" method=\"post\" action=\"/panel/contacts\">\n");
    input(out, "First Name", "firstname", "text", &v.firstname, true);
    input(out, "Last Name", "lastname", "text", &v.lastname, true);
    input(out, "Email", "email", "email", &v.email, true);
    input(out, "Phone", "phone", "tel", &v.phone, false);
    input(out, "Address", "address", "text", &v.address, false);
    out.push_str("<button type=\"submit\" id=\"create-contact-btn\">Create Contact</button>\n");
    out.push_str("</form>\n</section>\n");
}

fn options(out: &mut String, opts: &[ContactOption], selected: &str) {
    out.push_str("<option value=\"\">Select a contact...</option>\n");
    for o in opts {
        let _ = writeln!(
            out,
            "<option value=\"{}\"{}>{}</option>",
            attr(&o.value),
            if o.value == selected { " selected" } else { "" },
            text(&o.label)
        );
    }
}

fn deal_form_section(out: &mut String, f: &DealFormView, all: &[BannerView]) {
    out.push_str("<section id=\"create-deal-panel\">\n<h2>Create Deal</h2>\n");
    banners(out, all, BannerSlot::CreateDeal, "create-deal");
    out.push_str("<form id=\"create-deal-form\" method=\"post\" action=\"/panel/deals\">\n");
    let v = &f.values;
    input(out, "Deal Name", "dealname", "text", &v.dealname, true);
    input(out, "Amount", "amount", "number", &v.amount, true);
    out.push_str("<label>Contact<select id=\"deal-contact-id\" name=\"deal-contact-id\" required>\n");
    options(out, &f.contact_options, &v.contact_id);
    out.push_str("</select></label>\n");
    out.push_str("<button type=\"submit\" id=\"create-deal-btn\">Create Deal</button>\n");
    out.push_str("</form>\n</section>\n");
}

fn insight_section(out: &mut String, v: &InsightView, all: &[BannerView]) {
    out.push_str("<section id=\"ai-insights-panel\" class=\"span-2\">\n<h2>AI Insights</h2>\n");
    out.push_str("<form id=\"ai-insights-form\" method=\"post\" action=\"/panel/insights\">\n");
    out.push_str("<select id=\"ai-contact\" name=\"ai-contact\">\n");
    options(out, &v.contact_options, "");
    out.push_str("</select>\n<button type=\"submit\">Generate Insights</button>\n</form>\n");
    let _ = writeln!(
        out,
        "<div id=\"ai-insights-loading\" class=\"loading{}\">Generating insights...</div>",
        hidden(!v.loading)
    );
    banners(out, all, BannerSlot::Insight, "ai-insights");
    if let Some(blocks) = &v.blocks {
        out.push_str("<div id=\"ai-insights-result\"><div id=\"ai-insights-content\" class=\"insight\">\n");
        insight_blocks(out, blocks);
        out.push_str("</div>\n");
        if let Some(ts) = &v.generated_at {
            let _ = writeln!(out, "<small>Generated {}</small>", text(ts));
        }
        out.push_str("</div>\n");
    }
    out.push_str("</section>\n");
}

fn insight_blocks(out: &mut String, blocks: &[Block]) {
    for b in blocks {
        let (open, close, inlines) = match b {
            Block::Heading(i) => ("<h4>", "</h4>", i),
            Block::Paragraph(i) => ("<p>", "</p>", i),
        };
        out.push_str(open);
        for inline in inlines {
            match inline {
                Inline::Text(s) => out.push_str(&text(s)),
                Inline::Strong(s) => {
                    let _ = write!(out, "<strong>{}</strong>", text(s));
                }
            }
        }
        out.push_str(close);
        out.push('\n');
    }
}

fn deals_modal(out: &mut String, m: &DealsModalView) {
    out.push_str("<div id=\"deals-modal\" class=\"modal show\">\n<div class=\"modal-content\">\n");
    out.push_str("<a class=\"close\" href=\"/\">&times;</a>\n");
    let _ = writeln!(
        out,
        "<h3>Subscriptions for <span id=\"deals-contact-name\">{}</span></h3>",
        text(&m.contact_name)
    );
    let _ = writeln!(
        out,
        "<div id=\"deals-loading\" class=\"loading{}\">Loading deals...</div>",
        hidden(!m.loading)
    );
    if let Some(err) = &m.error {
        let _ = writeln!(out, "<div id=\"deals-error\" class=\"error\">{}</div>", text(err));
    }
    out.push_str("<div id=\"deals-list\">\n");
    if let Some(msg) = m.empty_message {
        let _ = writeln!(out, "<div class=\"empty-message\">{}</div>", text(msg));
    }
    for c in &m.cards {
        let _ = writeln!(
            out,
            "<div class=\"deal-item\"><div><strong>Deal Name:</strong> {}</div>\
<div><strong>Amount:</strong> ${}</div><div><strong>Stage:</strong> {}</div></div>",
            text(&c.name),
            text(&c.amount),
            text(&c.stage)
        );
    }
    out.push_str("</div>\n</div>\n</div>\n");
}
