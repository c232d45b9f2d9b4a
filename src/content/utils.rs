//! Helpers over a validated configuration.

use serde::Serialize;
use serde_json::{json, Value};

use crate::content::model::{
    ClientConfig, Contact, Course, CourseLevel, DiveSite, SiteDifficulty, TeamMember,
};

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Currencies rendered with a symbol instead of their code.
const CURRENCY_SYMBOLS: [(&str, &str); 4] = [("USD", "$"), ("EUR", "€"), ("GBP", "£"), ("JPY", "¥")];

/// Feature flags addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Booking,
    Gallery,
    Blog,
    Testimonials,
    MultiCurrency,
    WhatsappWidget,
    LiveChat,
}

/// A way to reach the dive shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactMethod {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
    pub label: &'static str,
}

/// "15 years experience • 2 certification(s)"
pub fn format_team_member_experience(member: &TeamMember) -> String {
    let mut parts = Vec::new();
    if let Some(years) = member.years_experience.filter(|y| *y > 0) {
        parts.push(format!("{} years experience", years));
    }
    if let Some(certs) = member.certifications.as_ref().filter(|c| !c.is_empty()) {
        parts.push(format!("{} certification(s)", certs.len()));
    }
    parts.join(" • ")
}

/// en-US currency formatting: `format_price(1234.5, "eur")` is "€1,234.50".
/// Codes without a known symbol are prefixed, as in "MUR 450.00".
pub fn format_price(amount: f64, currency: &str) -> String {
    let code = currency.to_uppercase();
    let prefix = match CURRENCY_SYMBOLS.iter().find(|(c, _)| *c == code) {
        Some((_, symbol)) => symbol.to_string(),
        None => format!("{} ", code),
    };

    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}{}.{}", sign, prefix, grouped, cents)
}

pub fn courses_by_level(courses: &[Course], level: CourseLevel) -> Vec<&Course> {
    courses.iter().filter(|c| c.level == level).collect()
}

pub fn dive_sites_by_difficulty(sites: &[DiveSite], difficulty: SiteDifficulty) -> Vec<&DiveSite> {
    sites.iter().filter(|s| s.difficulty == difficulty).collect()
}

/// One `Day: open - close` line per open weekday, Monday first.
pub fn format_business_hours(contact: &Contact) -> String {
    WEEKDAYS
        .iter()
        .filter_map(|day| {
            let hours = contact.business_hours.get(*day)?;
            if hours.closed == Some(true) {
                return None;
            }
            Some(format!("{}: {} - {}", capitalize(day), hours.open, hours.close))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// schema.org `Organization` structured data.
pub fn organization_schema(config: &ClientConfig) -> Value {
    let address = &config.contact.address;
    json!({
        "@context": "https://schema.org",
        "@type": "Organization",
        "name": config.company.name,
        "description": config.company.description,
        "url": config.seo.base_url,
        "logo": config.branding.logo,
        "contactPoint": {
            "@type": "ContactPoint",
            "telephone": config.contact.phone,
            "email": config.contact.email,
            "contactType": "customer service",
        },
        "address": {
            "@type": "PostalAddress",
            "streetAddress": address.street,
            "addressLocality": address.city,
            "addressRegion": address.state,
            "postalCode": address.postal_code,
            "addressCountry": address.country,
        },
        "geo": {
            "@type": "GeoCoordinates",
            "latitude": address.coordinates.latitude,
            "longitude": address.coordinates.longitude,
        },
        "sameAs": config.social.links(),
    })
}

pub fn primary_color_css_var(config: &ClientConfig) -> String {
    format!("--primary-color: {};", config.branding.colors.primary)
}

pub fn is_feature_enabled(config: &ClientConfig, feature: Feature) -> bool {
    let flags = &config.features;
    match feature {
        Feature::Booking => flags.booking,
        Feature::Gallery => flags.gallery,
        Feature::Blog => flags.blog,
        Feature::Testimonials => flags.testimonials,
        Feature::MultiCurrency => flags.multi_currency,
        Feature::WhatsappWidget => flags.whatsapp_widget,
        Feature::LiveChat => flags.live_chat == Some(true),
    }
}

pub fn supported_currencies(config: &ClientConfig) -> &[String] {
    &config.pricing.currencies
}

/// Non-empty phone, WhatsApp and email entries, in that order.
pub fn available_contact_methods(config: &ClientConfig) -> Vec<ContactMethod> {
    let contact = &config.contact;
    [
        ("phone", &contact.phone, "Call Us"),
        ("whatsapp", &contact.whatsapp, "WhatsApp"),
        ("email", &contact.email, "Email Us"),
    ]
    .into_iter()
    .filter(|(_, value, _)| !value.is_empty())
    .map(|(kind, value, label)| ContactMethod {
        kind,
        value: value.clone(),
        label,
    })
    .collect()
}
