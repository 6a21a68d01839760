//! User-visible report text per locale

use super::Locale;

pub(crate) struct Strings {
    pub title: &'static str,
    pub html_title: &'static str,
    pub subtitle: &'static str,
    pub intro: &'static str,
    pub total_cars: &'static str,
    pub total_profit: &'static str,
    pub average_profit: &'static str,
    pub profitable_cars: &'static str,
    pub profit: &'static str,
    pub margin: &'static str,
    pub cost: &'static str,
    pub auction: &'static str,
    pub link: &'static str,
    pub view_listing: &'static str,
    pub empty: &'static str,
    pub cta_text: &'static str,
    pub cta_button: &'static str,
    pub generated_at: &'static str,
    pub footer: &'static str,
    pub footer_note: Option<&'static str>,
    pub contact_heading: &'static str,
    pub contact_name: &'static str,
    pub contact_email: &'static str,
    pub contact_phone: &'static str,
    pub contact_message: &'static str,
    pub not_available: &'static str,
}

static EN_US: Strings = Strings {
    title: "Top 10 Most Profitable Cars",
    html_title: "Top 10 Most Profitable Cars",
    subtitle: "CarBot Market Analysis",
    intro: "Here are the top 10 most profitable cars based on current market analysis:",
    total_cars: "Total Cars",
    total_profit: "Total Profit",
    average_profit: "Average Profit",
    profitable_cars: "Profitable Cars",
    profit: "Profit",
    margin: "Margin",
    cost: "Cost",
    auction: "Auction",
    link: "Link",
    view_listing: "View on Auto1",
    empty: "No profitable cars found at this time.",
    cta_text: "Visit Auto1 to find great deals",
    cta_button: "Browse Cars on Auto1",
    generated_at: "Sent at",
    footer: "CarBot - Your Automotive Market Intelligence",
    footer_note: None,
    contact_heading: "Contact Request",
    contact_name: "Name",
    contact_email: "Email",
    contact_phone: "Phone",
    contact_message: "Message",
    not_available: "N/A",
};

static RO_RO: Strings = Strings {
    title: "Raport Zilnic: Top 10 Cele Mai Profitabile Mașini",
    html_title: "📊 Raport Zilnic de Profit",
    subtitle: "Top 10 Cele Mai Profitabile Mașini",
    intro: "Iată cele mai profitabile 10 mașini de astăzi bazate pe analiza curentă a pieței:",
    total_cars: "Total Mașini",
    total_profit: "Profit Total",
    average_profit: "Profit Mediu",
    profitable_cars: "Mașini Profitabile",
    profit: "Profit",
    margin: "Marjă",
    cost: "Cost",
    auction: "Licitație",
    link: "Link",
    view_listing: "Vezi pe Auto1 →",
    empty: "Nu s-au găsit mașini profitabile în acest moment.",
    cta_text: "Vizitează Auto1 pentru oferte grozave",
    cta_button: "Vezi Mașinile pe Auto1",
    generated_at: "Raport generat la",
    footer: "CarBot - Informații despre Piața Auto",
    footer_note: Some("Raport automat zilnic"),
    contact_heading: "Cerere de Contact",
    contact_name: "Nume",
    contact_email: "Email",
    contact_phone: "Telefon",
    contact_message: "Mesaj",
    not_available: "N/A",
};

pub(crate) fn strings_for(locale: Locale) -> &'static Strings {
    match locale {
        Locale::EnUs => &EN_US,
        Locale::RoRo => &RO_RO,
    }
}
