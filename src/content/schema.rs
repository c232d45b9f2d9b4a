//! Client configuration schema.
//!
//! The schema is plain data: a tree of [`Rule`]s describing shape, types and
//! constraints of a tenant document. It has no behavior of its own; the
//! validator walks it against an untyped `serde_json::Value`.
//!
//! # Design Decisions
//! - Built once, shared process-wide (`client_config_schema()`)
//! - Objects are strict: unknown keys are reported, never dropped
//! - Only `config` and `contact.businessHours` accept arbitrary keys

use std::sync::LazyLock;

use regex::Regex;

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("slug pattern compiles"));

static HEX_COLOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("hex color pattern compiles"));

static CURRENCY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{3}$").expect("currency pattern compiles"));

static CLIENT_CONFIG: LazyLock<Rule> = LazyLock::new(build_client_config);

/// A constraint node in the schema tree.
#[derive(Debug)]
pub enum Rule {
    String(StringRule),
    Number(NumberRule),
    Boolean,
    /// One of a fixed set of string values.
    Enum(&'static [&'static str]),
    Array(Box<Rule>),
    Object(ObjectRule),
    /// String-keyed map whose values all satisfy the inner rule.
    Record(Box<Rule>),
    Any,
}

/// Formats a string may be required to satisfy.
#[derive(Debug, Clone, Copy)]
pub enum StringFormat {
    Url,
    Email,
    Uuid,
    /// UTC ISO-8601 timestamp (`...Z`).
    DateTime,
    Pattern {
        regex: &'static Regex,
        label: &'static str,
    },
}

#[derive(Debug, Default)]
pub struct StringRule {
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub exact_len: Option<usize>,
    pub format: Option<StringFormat>,
}

impl StringRule {
    pub fn min(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    pub fn max(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    pub fn length(mut self, len: usize) -> Self {
        self.exact_len = Some(len);
        self
    }

    pub fn url(self) -> Self {
        self.format(StringFormat::Url)
    }

    pub fn email(self) -> Self {
        self.format(StringFormat::Email)
    }

    pub fn uuid(self) -> Self {
        self.format(StringFormat::Uuid)
    }

    pub fn datetime(self) -> Self {
        self.format(StringFormat::DateTime)
    }

    pub fn pattern(self, regex: &'static Regex, label: &'static str) -> Self {
        self.format(StringFormat::Pattern { regex, label })
    }

    fn format(mut self, format: StringFormat) -> Self {
        self.format = Some(format);
        self
    }
}

#[derive(Debug, Default)]
pub struct NumberRule {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Strictly greater than zero.
    pub positive: bool,
    /// Must be a JSON integer.
    pub integer: bool,
}

impl NumberRule {
    pub fn min(mut self, value: f64) -> Self {
        self.min = Some(value);
        self
    }

    pub fn max(mut self, value: f64) -> Self {
        self.max = Some(value);
        self
    }

    pub fn positive(mut self) -> Self {
        self.positive = true;
        self
    }

    /// Non-negative integer that fits the typed model's `u32` counts.
    pub fn count(mut self) -> Self {
        self.integer = true;
        self.min = Some(0.0);
        self.max = Some(f64::from(u32::MAX));
        self
    }
}

#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub rule: Rule,
    pub required: bool,
}

#[derive(Debug)]
pub struct ObjectRule {
    pub fields: Vec<Field>,
    /// Reject keys not listed in `fields`.
    pub strict: bool,
}

impl ObjectRule {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl From<StringRule> for Rule {
    fn from(rule: StringRule) -> Self {
        Rule::String(rule)
    }
}

impl From<NumberRule> for Rule {
    fn from(rule: NumberRule) -> Self {
        Rule::Number(rule)
    }
}

impl From<ObjectRule> for Rule {
    fn from(rule: ObjectRule) -> Self {
        Rule::Object(rule)
    }
}

pub fn string() -> StringRule {
    StringRule::default()
}

pub fn number() -> NumberRule {
    NumberRule::default()
}

pub fn boolean() -> Rule {
    Rule::Boolean
}

pub fn one_of(values: &'static [&'static str]) -> Rule {
    Rule::Enum(values)
}

pub fn array(item: impl Into<Rule>) -> Rule {
    Rule::Array(Box::new(item.into()))
}

pub fn record(value: impl Into<Rule>) -> Rule {
    Rule::Record(Box::new(value.into()))
}

pub fn object(fields: impl IntoIterator<Item = Field>) -> ObjectRule {
    ObjectRule {
        fields: fields.into_iter().collect(),
        strict: true,
    }
}

pub fn required(name: &'static str, rule: impl Into<Rule>) -> Field {
    Field {
        name,
        rule: rule.into(),
        required: true,
    }
}

pub fn optional(name: &'static str, rule: impl Into<Rule>) -> Field {
    Field {
        name,
        rule: rule.into(),
        required: false,
    }
}

fn strings() -> Rule {
    array(string())
}

fn hex_color() -> StringRule {
    string().pattern(&HEX_COLOR_PATTERN, "hex color")
}

fn currency_code() -> StringRule {
    string().pattern(&CURRENCY_PATTERN, "currency code")
}

fn coordinates() -> ObjectRule {
    object([
        required("latitude", number().min(-90.0).max(90.0)),
        required("longitude", number().min(-180.0).max(180.0)),
    ])
}

/// The process-wide client configuration schema.
pub fn client_config_schema() -> &'static Rule {
    &CLIENT_CONFIG
}

fn team_member() -> ObjectRule {
    object([
        required("id", string()),
        required("name", string().min(1)),
        required("role", string().min(1)),
        required("bio", string()),
        optional("certifications", strings()),
        required("image", string()),
        optional("languages", strings()),
        optional("specialties", strings()),
        optional("yearsExperience", number().count()),
        optional("education", strings()),
        optional("linkedin", string().url()),
    ])
}

fn course() -> ObjectRule {
    object([
        required("id", string()),
        required("name", string().min(1)),
        required(
            "level",
            one_of(&["beginner", "intermediate", "advanced", "professional"]),
        ),
        required("price", number().positive()),
        required("currency", currency_code()),
        required("duration", string()),
        optional("maxStudents", number().count()),
        optional("minAge", number().count()),
        optional("prerequisites", strings()),
        required("description", string()),
        optional("curriculum", strings()),
        optional("included", strings()),
        optional("certificationBody", string()),
        optional("image", string()),
    ])
}

fn dive_site() -> ObjectRule {
    object([
        required("id", string()),
        required("name", string().min(1)),
        required("description", string()),
        required("difficulty", one_of(&["beginner", "intermediate", "advanced"])),
        required(
            "depth",
            object([
                required("min", number()),
                required("max", number()),
                required("unit", one_of(&["meters", "feet"])),
            ]),
        ),
        required("coordinates", coordinates()),
        required("marineLife", strings()),
        optional("features", strings()),
        optional("bestSeason", string()),
        optional("visibility", string()),
        optional("current", string()),
        optional("temperature", string()),
        optional("image", string()),
    ])
}

fn gallery_image() -> ObjectRule {
    object([
        required("id", string()),
        required("src", string().url()),
        optional("thumbnail", string().url()),
        required("alt", string()),
        optional("title", string()),
        required("category", string()),
        optional("photographer", string()),
        optional("date", string()),
    ])
}

fn testimonial() -> ObjectRule {
    object([
        required("id", string()),
        required("name", string().min(1)),
        optional("role", string()),
        required("content", string().min(10)),
        optional("rating", number().min(1.0).max(5.0)),
        optional("date", string()),
        optional("avatar", string()),
        optional("location", string()),
    ])
}

fn blog_post() -> ObjectRule {
    object([
        required("id", string()),
        required("title", string().min(1)),
        required("slug", string().min(1)),
        required("excerpt", string()),
        optional("content", string()),
        required("author", string()),
        required("date", string()),
        required("category", string()),
        optional("tags", strings()),
        optional("image", string()),
        optional("url", string().url()),
    ])
}

fn service() -> ObjectRule {
    object([
        required("id", string()),
        required("name", string().min(1)),
        required("description", string()),
        optional("icon", string()),
        optional("features", strings()),
        optional("benefits", strings()),
        optional(
            "pricing",
            object([
                required(
                    "model",
                    one_of(&["fixed", "hourly", "subscription", "custom"]),
                ),
                optional("amount", number()),
                optional("currency", currency_code()),
                optional("period", string()),
            ]),
        ),
        optional("deliverables", strings()),
        optional("timeline", string()),
        optional("image", string()),
    ])
}

fn product() -> ObjectRule {
    object([
        required("id", string()),
        required("name", string().min(1)),
        required("description", string()),
        required("category", string()),
        optional("features", strings()),
        optional(
            "pricing",
            object([
                required("amount", number()),
                required("currency", currency_code()),
                optional("period", string()),
            ]),
        ),
        optional("documentation", string().url()),
        optional("demo", string().url()),
        optional("image", string()),
    ])
}

fn case_study() -> ObjectRule {
    object([
        required("id", string()),
        required("title", string().min(1)),
        required("client", string()),
        required("industry", string()),
        required("challenge", string()),
        required("solution", string()),
        optional("results", strings()),
        optional("technologies", strings()),
        optional("duration", string()),
        optional("teamSize", number().count()),
        optional("image", string()),
        optional("url", string().url()),
    ])
}

fn build_client_config() -> Rule {
    object([
        required(
            "tenant",
            object([
                required("id", string().uuid()),
                required("slug", string().pattern(&SLUG_PATTERN, "slug")),
                required("name", string().min(1)),
                required("status", one_of(&["active", "inactive", "suspended"])),
                required("createdAt", string().datetime()),
                required("updatedAt", string().datetime()),
            ]),
        ),
        required(
            "company",
            object([
                required("name", string().min(1)),
                required("tagline", string()),
                required("description", string()),
                required("about", string()),
                optional("coreValues", strings()),
                optional("certifications", strings()),
                optional("established", number().count()),
            ]),
        ),
        required(
            "contact",
            object([
                required("phone", string()),
                required("whatsapp", string()),
                required("email", string().email()),
                required(
                    "address",
                    object([
                        required("street", string()),
                        required("city", string()),
                        optional("state", string()),
                        required("postalCode", string()),
                        required("country", string()),
                        required("coordinates", coordinates()),
                    ]),
                ),
                required(
                    "businessHours",
                    record(object([
                        required("open", string()),
                        required("close", string()),
                        optional("closed", boolean()),
                    ])),
                ),
            ]),
        ),
        required("team", array(team_member())),
        optional("services", array(service())),
        optional("products", array(product())),
        optional("courses", array(course())),
        optional("diveSites", array(dive_site())),
        optional("caseStudies", array(case_study())),
        required("gallery", array(gallery_image())),
        optional("testimonials", array(testimonial())),
        optional("blog", array(blog_post())),
        required(
            "branding",
            object([
                required("logo", string()),
                required("favicon", string()),
                required("heroImage", string()),
                optional("bannerImage", string()),
                required(
                    "colors",
                    object([
                        required("primary", hex_color()),
                        required("secondary", hex_color()),
                        optional("accent", hex_color()),
                    ]),
                ),
            ]),
        ),
        required(
            "social",
            object([
                optional("facebook", string().url()),
                optional("instagram", string().url()),
                optional("twitter", string().url()),
                optional("youtube", string().url()),
                optional("tripAdvisor", string().url()),
                optional("google", string().url()),
                optional("linkedin", string().url()),
            ]),
        ),
        required(
            "seo",
            object([
                required("title", string().min(1)),
                required("description", string().min(10).max(160)),
                required("keywords", strings()),
                optional("author", string()),
                required("baseUrl", string().url()),
                optional("ogImage", string()),
            ]),
        ),
        optional(
            "analytics",
            object([
                optional("googleAnalyticsId", string()),
                optional("googleTagManagerId", string()),
                optional("facebookPixelId", string()),
            ]),
        ),
        required(
            "features",
            object([
                required("booking", boolean()),
                required("gallery", boolean()),
                required("blog", boolean()),
                required("testimonials", boolean()),
                required("multiCurrency", boolean()),
                required("whatsappWidget", boolean()),
                optional("liveChat", boolean()),
            ]),
        ),
        required(
            "pricing",
            object([
                required("defaultCurrency", currency_code()),
                required("currencies", array(currency_code())),
            ]),
        ),
        optional("config", record(Rule::Any)),
    ])
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_strict_object() {
        match client_config_schema() {
            Rule::Object(root) => {
                assert!(root.strict);
                assert!(root.field("tenant").is_some_and(|f| f.required));
                assert!(root.field("courses").is_some_and(|f| !f.required));
                assert!(matches!(
                    root.field("config").map(|f| &f.rule),
                    Some(Rule::Record(_))
                ));
            }
            other => panic!("expected object rule, got {:?}", other),
        }
    }

    #[test]
    fn test_patterns() {
        assert!(HEX_COLOR_PATTERN.is_match("#0A7Bc4"));
        assert!(!HEX_COLOR_PATTERN.is_match("#0A7Bc"));
        assert!(!HEX_COLOR_PATTERN.is_match("0A7Bc4"));
        assert!(SLUG_PATTERN.is_match("ocean-spirit-2"));
        assert!(!SLUG_PATTERN.is_match("Ocean Spirit"));
    }
}
