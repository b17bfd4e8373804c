pub mod extract;

pub use extract::{ extract, AnswerLine, DELIMITER };

use serde::{ Deserialize, Serialize };

/// Profile fields in their fixed order. The order drives both extraction and
/// the positional slots of the delimited form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Description,
    Services,
    TargetAudience,
    Location,
    Contact,
    Style,
    CallToAction,
    Personality,
    Phone,
    Email,
    Address,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Name,
        Field::Description,
        Field::Services,
        Field::TargetAudience,
        Field::Location,
        Field::Contact,
        Field::Style,
        Field::CallToAction,
        Field::Personality,
        Field::Phone,
        Field::Email,
        Field::Address,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Business name",
            Field::Description => "Description",
            Field::Services => "Services",
            Field::TargetAudience => "Target audience",
            Field::Location => "Location",
            Field::Contact => "Contact",
            Field::Style => "Preferred style",
            Field::CallToAction => "Call to action",
            Field::Personality => "Brand personality",
            Field::Phone => "Phone",
            Field::Email => "Email",
            Field::Address => "Address",
        }
    }

    pub fn rule(&self) -> &'static FieldRule {
        &FIELD_RULES[*self as usize]
    }
}

pub struct FieldRule {
    pub field: Field,
    pub keywords: &'static [&'static str],
    pub default: &'static str,
}

/// Keyword sets are matched case-insensitively against a line's question and answer.
pub static FIELD_RULES: [FieldRule; 12] = [
    FieldRule {
        field: Field::Name,
        keywords: &["name", "called"],
        default: "Your Business",
    },
    FieldRule {
        field: Field::Description,
        keywords: &[
            "what your business does",
            "about your business",
            "describe your business",
            "we sell",
            "we are a",
            "we're a",
        ],
        default: "A trusted local business dedicated to quality work and genuine customer care.",
    },
    FieldRule {
        field: Field::Services,
        keywords: &["services", "offer", "products"],
        default: "Professional services tailored to every customer's needs",
    },
    FieldRule {
        field: Field::TargetAudience,
        keywords: &["audience", "customer", "clients"],
        default: "Local residents, families and visitors",
    },
    FieldRule {
        field: Field::Location,
        keywords: &["located", "location", "where", "city", "based in"],
        default: "Proudly serving the local community",
    },
    FieldRule {
        field: Field::Contact,
        keywords: &["contact", "reach"],
        default: "Call or email us any time",
    },
    FieldRule {
        field: Field::Style,
        keywords: &["style", "look", "design", "colors"],
        default: "Modern, clean and professional",
    },
    FieldRule {
        field: Field::CallToAction,
        keywords: &["visitors should", "call to action"],
        default: "Get in touch today",
    },
    FieldRule {
        field: Field::Personality,
        keywords: &["personality", "tone", "brand voice", "vibe"],
        default: "Friendly, reliable and welcoming",
    },
    FieldRule {
        field: Field::Phone,
        keywords: &["phone", "telephone"],
        default: "(555) 123-4567",
    },
    FieldRule {
        field: Field::Email,
        keywords: &["email", "e-mail"],
        default: "info@example.com",
    },
    FieldRule {
        field: Field::Address,
        keywords: &["address", "street"],
        default: "123 Main Street",
    },
];

/// A fully populated business summary. Every field holds a non-empty string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    pub name: String,
    pub description: String,
    pub services: String,
    pub target_audience: String,
    pub location: String,
    pub contact: String,
    pub style: String,
    pub call_to_action: String,
    pub personality: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        let mut profile = Self {
            name: String::new(),
            description: String::new(),
            services: String::new(),
            target_audience: String::new(),
            location: String::new(),
            contact: String::new(),
            style: String::new(),
            call_to_action: String::new(),
            personality: String::new(),
            phone: String::new(),
            email: String::new(),
            address: String::new(),
        };
        for rule in FIELD_RULES.iter() {
            profile.set(rule.field, rule.default.to_string());
        }
        profile
    }
}

impl BusinessProfile {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Description => &self.description,
            Field::Services => &self.services,
            Field::TargetAudience => &self.target_audience,
            Field::Location => &self.location,
            Field::Contact => &self.contact,
            Field::Style => &self.style,
            Field::CallToAction => &self.call_to_action,
            Field::Personality => &self.personality,
            Field::Phone => &self.phone,
            Field::Email => &self.email,
            Field::Address => &self.address,
        }
    }

    pub(crate) fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Description => &mut self.description,
            Field::Services => &mut self.services,
            Field::TargetAudience => &mut self.target_audience,
            Field::Location => &mut self.location,
            Field::Contact => &mut self.contact,
            Field::Style => &mut self.style,
            Field::CallToAction => &mut self.call_to_action,
            Field::Personality => &mut self.personality,
            Field::Phone => &mut self.phone,
            Field::Email => &mut self.email,
            Field::Address => &mut self.address,
        };
        *slot = value;
    }

    pub fn is_default(&self, field: Field) -> bool {
        self.get(field) == field.rule().default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_table_follows_field_order() {
        for (idx, field) in Field::ALL.iter().enumerate() {
            assert_eq!(FIELD_RULES[idx].field, *field);
            assert!(!FIELD_RULES[idx].keywords.is_empty());
            assert!(!FIELD_RULES[idx].default.trim().is_empty());
        }
    }

    #[test]
    fn default_profile_uses_rule_defaults() {
        let profile = BusinessProfile::default();
        for field in Field::ALL {
            assert!(profile.is_default(field));
        }
        assert_eq!(profile.name, "Your Business");
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let value = serde_json::to_value(BusinessProfile::default()).unwrap();
        assert!(value.get("targetAudience").is_some());
        assert!(value.get("callToAction").is_some());
    }
}
