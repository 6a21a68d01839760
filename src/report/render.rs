//! Plaintext and HTML report rendering

use super::strings::{strings_for, Strings};
use super::{Currency, Locale};
use crate::models::{Car, ContactMessage};
use crate::stats::AggregateStats;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Reports never list more than this many cars
pub const MAX_REPORT_CARS: usize = 10;

const AUTO1_URL: &str = "https://www.auto1.com";

/// Which trigger a report is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    OnDemand,
    Daily,
}

/// Locale, currency and clock a report is rendered with
#[derive(Debug, Clone, PartialEq)]
pub struct ReportProfile {
    pub kind: ReportKind,
    pub locale: Locale,
    pub currency: Currency,
    pub timezone: Tz,
}

impl ReportProfile {
    /// English / USD report sent for a contact submission
    pub fn on_demand() -> Self {
        Self {
            kind: ReportKind::OnDemand,
            locale: Locale::EnUs,
            currency: Currency::Usd,
            timezone: Tz::UTC,
        }
    }

    /// Romanian / EUR report sent by the daily trigger
    pub fn daily() -> Self {
        Self {
            kind: ReportKind::Daily,
            locale: Locale::RoRo,
            currency: Currency::Eur,
            timezone: chrono_tz::Europe::Bucharest,
        }
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    fn money(&self, amount: f64) -> String {
        self.locale.format_currency(amount, self.currency)
    }

    fn percent(&self, value: Option<f64>, strings: &Strings) -> String {
        self.locale
            .format_percent(value)
            .unwrap_or_else(|| strings.not_available.to_string())
    }

    fn subject(&self, strings: &Strings, generated_at: DateTime<Utc>) -> String {
        match self.kind {
            ReportKind::OnDemand => format!("{} - CarBot Report", strings.title),
            ReportKind::Daily => format!(
                "{} - {}",
                strings.title,
                self.locale.format_date(generated_at, self.timezone)
            ),
        }
    }
}

/// A fully rendered email
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub subject: String,
    pub text: String,
    pub html: String,
    /// Aggregates over the rendered cars
    pub stats: AggregateStats,
}

/// Render a report for cars already ranked by profit descending
pub fn render_report(
    cars: &[Car],
    profile: &ReportProfile,
    contact: Option<&ContactMessage>,
    generated_at: DateTime<Utc>,
) -> RenderedReport {
    let cars = &cars[..cars.len().min(MAX_REPORT_CARS)];
    let strings = strings_for(profile.locale);
    let stats = AggregateStats::from_cars(cars);
    let generated = profile.locale.format_datetime(generated_at, profile.timezone);

    RenderedReport {
        subject: profile.subject(strings, generated_at),
        text: render_text(cars, profile, strings, &stats, contact, &generated),
        html: render_html(cars, profile, strings, &stats, contact, &generated, generated_at),
        stats,
    }
}

// ============================================================================
// Plaintext
// ============================================================================

fn render_text(
    cars: &[Car],
    profile: &ReportProfile,
    strings: &Strings,
    stats: &AggregateStats,
    contact: Option<&ContactMessage>,
    generated: &str,
) -> String {
    let mut out = String::new();

    out.push_str(strings.title);
    out.push_str("\n\n");
    out.push_str(&format!(
        "{}: {} | {}: {} | {}: {} | {}: {}\n\n",
        strings.total_cars,
        stats.count,
        strings.total_profit,
        profile.money(stats.total_profit),
        strings.average_profit,
        profile.money(stats.average_profit),
        strings.profitable_cars,
        stats.profitable_count,
    ));

    if cars.is_empty() {
        out.push_str(strings.empty);
        out.push_str("\n\n");
    }

    for (index, car) in cars.iter().enumerate() {
        out.push_str(&format!("{}. {} ({})\n", index + 1, car.make_model, car.year));
        out.push_str(&format!(
            "   {}: {} ({})\n",
            strings.profit,
            profile.money(car.profit),
            profile.percent(car.profit_percentage, strings)
        ));
        out.push_str(&format!(
            "   {}: {} | {}: {}\n",
            strings.cost,
            profile.money(car.total_cost),
            strings.auction,
            profile.money(car.end_auction_price)
        ));
        if let Some(link) = &car.auto1_link {
            out.push_str(&format!("   {}: {}\n", strings.link, link));
        }
        out.push('\n');
    }

    if let Some(contact) = contact {
        out.push_str(strings.contact_heading);
        out.push('\n');
        out.push_str(&format!("   {}: {}\n", strings.contact_name, contact.name));
        out.push_str(&format!("   {}: {}\n", strings.contact_email, contact.email));
        out.push_str(&format!("   {}: {}\n", strings.contact_phone, contact.phone));
        out.push_str(&format!("   {}:\n", strings.contact_message));
        for line in contact.message.lines() {
            out.push_str("   ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str(&format!("{}: {}\n\n", strings.cta_text, AUTO1_URL));
    out.push_str(&format!("{}: {}\n", strings.generated_at, generated));

    out
}

// ============================================================================
// HTML
// ============================================================================

const ACCENT: &str = "#667eea";
const ACCENT_DARK: &str = "#764ba2";

fn render_html(
    cars: &[Car],
    profile: &ReportProfile,
    strings: &Strings,
    stats: &AggregateStats,
    contact: Option<&ContactMessage>,
    generated: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let long_date = profile.locale.format_long_date(generated_at, profile.timezone);

    let rows = if cars.is_empty() {
        format!(
            r#"<tr><td style="padding: 30px; text-align: center; color: #666;">{}</td></tr>"#,
            escape_html(strings.empty)
        )
    } else {
        cars.iter()
            .enumerate()
            .map(|(index, car)| render_car_row(index + 1, car, profile, strings))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let contact_block = contact
        .map(|c| render_contact_block(c, strings))
        .unwrap_or_default();

    let footer_note = strings
        .footer_note
        .map(|note| {
            format!(
                r#"<p style="color: #999; font-size: 11px; margin: 5px 0 0 0;">{}</p>"#,
                escape_html(note)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; padding: 0; font-family: Arial, sans-serif; background-color: #f4f4f4;">
  <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #f4f4f4; padding: 20px;">
    <tr>
      <td align="center">
        <table width="600" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px; overflow: hidden;">
          <tr>
            <td style="background-color: {accent}; padding: 30px; text-align: center;">
              <h1 style="color: #ffffff; margin: 0; font-size: 28px;">{html_title}</h1>
              <p style="color: #f0f0f0; margin: 10px 0 0 0;">{subtitle}</p>
              <p style="color: #f0f0f0; margin: 5px 0 0 0; font-size: 14px;">{long_date}</p>
            </td>
          </tr>
          <tr>
            <td style="padding: 20px 30px; background-color: #f8f9fa;">
              <table width="100%" cellpadding="0" cellspacing="0">
                <tr>
{summary}
                </tr>
              </table>
            </td>
          </tr>
          <tr>
            <td style="padding: 30px;">
              <p style="color: #333; font-size: 16px; line-height: 1.6; margin-top: 0;">{intro}</p>
              <table width="100%" cellpadding="0" cellspacing="0" style="margin: 20px 0;">
{rows}
              </table>
{contact_block}
              <table width="100%" cellpadding="0" cellspacing="0" style="margin: 30px 0;">
                <tr>
                  <td align="center">
                    <a href="{auto1}" style="display: inline-block; padding: 15px 40px; background-color: {accent_dark}; color: #ffffff; text-decoration: none; border-radius: 5px; font-weight: bold; font-size: 16px;">{cta_button}</a>
                  </td>
                </tr>
              </table>
              <p style="color: #666; font-size: 14px; margin-bottom: 0;">{generated_label}: {generated}</p>
            </td>
          </tr>
          <tr>
            <td style="background-color: #f8f9fa; padding: 20px; text-align: center; border-top: 1px solid #e0e0e0;">
              <p style="color: #999; font-size: 12px; margin: 0;">{footer}</p>
              {footer_note}
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>
"#,
        lang = profile.locale.tag(),
        accent = ACCENT,
        accent_dark = ACCENT_DARK,
        html_title = escape_html(strings.html_title),
        subtitle = escape_html(strings.subtitle),
        long_date = escape_html(&long_date),
        summary = render_summary(stats, profile, strings),
        intro = escape_html(strings.intro),
        rows = rows,
        contact_block = contact_block,
        auto1 = AUTO1_URL,
        cta_button = escape_html(strings.cta_button),
        generated_label = escape_html(strings.generated_at),
        generated = escape_html(generated),
        footer = escape_html(strings.footer),
        footer_note = footer_note,
    )
}

fn render_summary(stats: &AggregateStats, profile: &ReportProfile, strings: &Strings) -> String {
    let cells = [
        (strings.total_cars, stats.count.to_string()),
        (strings.total_profit, profile.money(stats.total_profit)),
        (strings.average_profit, profile.money(stats.average_profit)),
        (strings.profitable_cars, stats.profitable_count.to_string()),
    ];

    cells
        .iter()
        .map(|(label, value)| {
            format!(
                r#"                  <td style="padding: 10px; text-align: center;">
                    <p style="margin: 0; color: #666; font-size: 12px;">{}</p>
                    <p style="margin: 5px 0 0 0; color: {}; font-size: 20px; font-weight: bold;">{}</p>
                  </td>"#,
                escape_html(label),
                ACCENT,
                escape_html(value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_car_row(rank: usize, car: &Car, profile: &ReportProfile, strings: &Strings) -> String {
    let title = if car.full_title.is_empty() {
        String::new()
    } else {
        format!(
            r#"<p style="margin: 5px 0 0 0; color: #666;">{}</p>"#,
            escape_html(&car.full_title)
        )
    };

    let button = car
        .auto1_link
        .as_ref()
        .map(|link| {
            format!(
                r#"<div style="margin-top: 10px;"><a href="{}" style="display: inline-block; padding: 8px 16px; background-color: {}; color: #ffffff; text-decoration: none; border-radius: 4px; font-size: 14px;">{}</a></div>"#,
                escape_html(link),
                ACCENT,
                escape_html(strings.view_listing)
            )
        })
        .unwrap_or_default();

    format!(
        r#"                <tr data-rank="{rank}">
                  <td style="padding: 15px; background-color: #f8f9fa; border-left: 4px solid {accent};">
                    <strong style="color: {accent}; font-size: 18px;">{rank}. {make_model} ({year})</strong>
                    {title}
                    <div style="margin-top: 10px;">
                      <span style="color: #28a745; font-weight: bold; margin-right: 15px;">{profit_label}: {profit}</span>
                      <span style="color: #666; margin-right: 15px;">{margin_label}: {margin}</span>
                    </div>
                    <div style="margin-top: 5px;">
                      <span style="color: #666; margin-right: 15px;">{cost_label}: {cost}</span>
                      <span style="color: #666;">{auction_label}: {auction}</span>
                    </div>
                    {button}
                  </td>
                </tr>
                <tr><td style="height: 10px;"></td></tr>"#,
        rank = rank,
        accent = ACCENT,
        make_model = escape_html(&car.make_model),
        year = escape_html(&car.year),
        title = title,
        profit_label = escape_html(strings.profit),
        profit = escape_html(&profile.money(car.profit)),
        margin_label = escape_html(strings.margin),
        margin = escape_html(&profile.percent(car.profit_percentage, strings)),
        cost_label = escape_html(strings.cost),
        cost = escape_html(&profile.money(car.total_cost)),
        auction_label = escape_html(strings.auction),
        auction = escape_html(&profile.money(car.end_auction_price)),
        button = button,
    )
}

fn render_contact_block(contact: &ContactMessage, strings: &Strings) -> String {
    let message = escape_html(&contact.message).replace('\n', "<br>");
    format!(
        r#"              <table width="100%" cellpadding="0" cellspacing="0" style="margin: 20px 0; border: 1px solid #e0e0e0; border-radius: 6px;">
                <tr>
                  <td style="padding: 15px;">
                    <strong style="color: {accent};">{heading}</strong>
                    <p style="margin: 8px 0 0 0; color: #333;">{name_label}: {name}</p>
                    <p style="margin: 4px 0 0 0; color: #333;">{email_label}: {email}</p>
                    <p style="margin: 4px 0 0 0; color: #333;">{phone_label}: {phone}</p>
                    <p style="margin: 8px 0 0 0; color: #333;">{message_label}:<br>{message}</p>
                  </td>
                </tr>
              </table>"#,
        accent = ACCENT,
        heading = escape_html(strings.contact_heading),
        name_label = escape_html(strings.contact_name),
        name = escape_html(&contact.name),
        email_label = escape_html(strings.contact_email),
        email = escape_html(&contact.email),
        phone_label = escape_html(strings.contact_phone),
        phone = escape_html(&contact.phone),
        message_label = escape_html(strings.contact_message),
        message = message,
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
