//! Locale-aware number and date formatting for reports

use chrono::{DateTime, Datelike, Utc, Weekday};
use chrono_tz::Tz;

/// Report language and number conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    EnUs,
    RoRo,
}

/// Report currency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Usd,
    Eur,
}

impl Locale {
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::RoRo => "ro-RO",
        }
    }

    fn group_separator(&self) -> char {
        match self {
            Locale::EnUs => ',',
            Locale::RoRo => '.',
        }
    }

    fn decimal_separator(&self) -> char {
        match self {
            Locale::EnUs => '.',
            Locale::RoRo => ',',
        }
    }

    /// Format a money amount, e.g. `$1,234.56` or `1.234,56 €`
    pub fn format_currency(&self, amount: f64, currency: Currency) -> String {
        let amount = if amount.is_finite() { amount } else { 0.0 };
        let cents = (amount.abs() * 100.0).round() as u64;
        let negative = amount < 0.0 && cents > 0;
        let number = format!(
            "{}{}{:02}",
            group_digits(cents / 100, self.group_separator()),
            self.decimal_separator(),
            cents % 100
        );
        let sign = if negative { "-" } else { "" };

        match (self, currency) {
            (Locale::EnUs, Currency::Usd) => format!("{}${}", sign, number),
            (Locale::EnUs, Currency::Eur) => format!("{}€{}", sign, number),
            (Locale::RoRo, Currency::Eur) => format!("{}{} €", sign, number),
            (Locale::RoRo, Currency::Usd) => format!("{}{} USD", sign, number),
        }
    }

    /// One-decimal percentage; `None` when the value is unknown
    pub fn format_percent(&self, value: Option<f64>) -> Option<String> {
        let value = value.filter(|v| v.is_finite())?;
        let text = format!("{:.1}", value);
        let text = match self.decimal_separator() {
            '.' => text,
            sep => text.replace('.', &sep.to_string()),
        };
        Some(format!("{}%", text))
    }

    /// Date and time, e.g. `10/16/2026, 10:20:00 PM` or `16.10.2026, 22:20:00`
    pub fn format_datetime(&self, at: DateTime<Utc>, tz: Tz) -> String {
        let local = at.with_timezone(&tz);
        match self {
            Locale::EnUs => local.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
            Locale::RoRo => local.format("%d.%m.%Y, %H:%M:%S").to_string(),
        }
    }

    /// Numeric date, e.g. `10/16/2026` or `16.10.2026`
    pub fn format_date(&self, at: DateTime<Utc>, tz: Tz) -> String {
        let local = at.with_timezone(&tz);
        match self {
            Locale::EnUs => local.format("%-m/%-d/%Y").to_string(),
            Locale::RoRo => local.format("%d.%m.%Y").to_string(),
        }
    }

    /// Long date, e.g. `Friday, October 16, 2026` or `vineri, 16 octombrie 2026`
    pub fn format_long_date(&self, at: DateTime<Utc>, tz: Tz) -> String {
        let local = at.with_timezone(&tz);
        let weekday = self.weekday_name(local.weekday());
        let month = self.month_name(local.month());
        match self {
            Locale::EnUs => format!("{}, {} {}, {}", weekday, month, local.day(), local.year()),
            Locale::RoRo => format!("{}, {} {} {}", weekday, local.day(), month, local.year()),
        }
    }

    fn weekday_name(&self, day: Weekday) -> &'static str {
        const EN: [&str; 7] = [
            "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
        ];
        const RO: [&str; 7] = [
            "luni", "marți", "miercuri", "joi", "vineri", "sâmbătă", "duminică",
        ];
        let idx = day.num_days_from_monday() as usize;
        match self {
            Locale::EnUs => EN[idx],
            Locale::RoRo => RO[idx],
        }
    }

    fn month_name(&self, month: u32) -> &'static str {
        const EN: [&str; 12] = [
            "January", "February", "March", "April", "May", "June", "July", "August",
            "September", "October", "November", "December",
        ];
        const RO: [&str; 12] = [
            "ianuarie", "februarie", "martie", "aprilie", "mai", "iunie", "iulie", "august",
            "septembrie", "octombrie", "noiembrie", "decembrie",
        ];
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            Locale::EnUs => EN[idx],
            Locale::RoRo => RO[idx],
        }
    }
}

fn group_digits(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Bucharest;

    #[test]
    fn test_currency_en_us() {
        let l = Locale::EnUs;
        assert_eq!(l.format_currency(1234.5, Currency::Usd), "$1,234.50");
        assert_eq!(l.format_currency(-98765.432, Currency::Usd), "-$98,765.43");
        assert_eq!(l.format_currency(0.0, Currency::Usd), "$0.00");
        assert_eq!(l.format_currency(1234.567, Currency::Usd), "$1,234.57");
        assert_eq!(l.format_currency(1_000_000.0, Currency::Eur), "€1,000,000.00");
    }

    #[test]
    fn test_currency_ro_ro() {
        let l = Locale::RoRo;
        assert_eq!(l.format_currency(1234.5, Currency::Eur), "1.234,50 €");
        assert_eq!(l.format_currency(-250.0, Currency::Eur), "-250,00 €");
        assert_eq!(l.format_currency(12.0, Currency::Usd), "12,00 USD");
        assert_eq!(l.format_currency(-0.001, Currency::Eur), "0,00 €");
    }

    #[test]
    fn test_percent() {
        assert_eq!(Locale::EnUs.format_percent(Some(12.345)).as_deref(), Some("12.3%"));
        assert_eq!(Locale::RoRo.format_percent(Some(-4.26)).as_deref(), Some("-4,3%"));
        assert_eq!(Locale::EnUs.format_percent(None), None);
        assert_eq!(Locale::EnUs.format_percent(Some(f64::NAN)), None);
    }

    #[test]
    fn test_dates() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 19, 20, 5).unwrap();
        assert_eq!(Locale::RoRo.format_datetime(at, Bucharest), "16.10.2026, 22:20:05");
        assert_eq!(Locale::RoRo.format_date(at, Bucharest), "16.10.2026");
        assert_eq!(Locale::RoRo.format_long_date(at, Bucharest), "vineri, 16 octombrie 2026");
        assert_eq!(Locale::EnUs.format_datetime(at, Tz::UTC), "10/16/2026, 7:20:05 PM");
        assert_eq!(Locale::EnUs.format_long_date(at, Tz::UTC), "Friday, October 16, 2026");
    }
}
