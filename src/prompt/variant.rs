use serde::{ Deserialize, Serialize };

/// The three fixed design presets. Selectors outside 1..=3 map to the first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    ModernProfessional,
    PremiumLuxury,
    BoldCreative,
}

pub struct Preset {
    pub name: &'static str,
    pub visual_style: &'static str,
    pub layout: &'static str,
}

const MODERN_PROFESSIONAL: Preset = Preset {
    name: "MODERN PROFESSIONAL",
    visual_style: "Clean white space, a confident primary brand color with one accent, crisp sans-serif typography, subtle shadows and rounded corners.",
    layout: "Full-width hero with headline and primary button, three-column services grid, alternating image/text about section, card-based reviews, contact form beside a map-style info block.",
};

const PREMIUM_LUXURY: Preset = Preset {
    name: "PREMIUM LUXURY",
    visual_style: "Deep dark backgrounds with gold or champagne accents, elegant serif headings, generous letter spacing, refined thin borders and soft glows.",
    layout: "Cinematic full-screen hero with overlay text, editorial split sections, large gallery with hover zoom, testimonial carousel, understated contact section with concierge tone.",
};

const BOLD_CREATIVE: Preset = Preset {
    name: "BOLD CREATIVE",
    visual_style: "Vibrant saturated colors, oversized display type, playful gradients, asymmetric shapes and energetic micro-animations.",
    layout: "Diagonal or layered hero, masonry gallery, services as bold tiles, sticker-style review badges, high-contrast call-to-action band before a playful contact section.",
};

impl Variant {
    pub fn from_selector(selector: i64) -> Self {
        match selector {
            2 => Variant::PremiumLuxury,
            3 => Variant::BoldCreative,
            _ => Variant::ModernProfessional,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Variant::ModernProfessional => 1,
            Variant::PremiumLuxury => 2,
            Variant::BoldCreative => 3,
        }
    }

    pub fn preset(&self) -> &'static Preset {
        match self {
            Variant::ModernProfessional => &MODERN_PROFESSIONAL,
            Variant::PremiumLuxury => &PREMIUM_LUXURY,
            Variant::BoldCreative => &BOLD_CREATIVE,
        }
    }

    pub fn name(&self) -> &'static str {
        self.preset().name
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::ModernProfessional
    }
}
