use super::images::ImageSet;
use super::variant::Variant;
use crate::profile::{ BusinessProfile, Field };

const SECTION_REQUIREMENTS: &[&str] = &[
    "Sticky navigation bar with the business name and anchor links to every section",
    "Hero section using the HERO image as a full-width background with the business name, a one-line value proposition and the call-to-action button",
    "Services section presenting each service as its own card with a short benefit-focused description",
    "Gallery section showing the remaining images in a responsive grid",
    "About section telling the business story, location and what makes it different",
    "Reviews section with three believable customer testimonials that match the target audience",
    "Contact section with phone, email, address and a simple contact form",
    "Footer with the business name, contact details and copyright line",
];

const VISUAL_EFFECTS: &[&str] = &[
    "Smooth scrolling between anchor links",
    "Fade-in or slide-up animation as sections enter the viewport",
    "Hover states on buttons, cards and gallery images",
    "Gradient or dark overlay on the hero image so text stays readable",
    "Fully responsive layout that works from 360px phones to wide desktops",
];

const AUTHENTICITY_RULES: &[&str] = &[
    "Write copy specific to this business; never use lorem ipsum or placeholder text",
    "Use the exact business name, phone, email and address given above",
    "Do not invent awards, certifications or prices that were not provided",
    "Keep the tone consistent with the brand personality",
];

const OUTPUT_RULES: &[&str] = &[
    "Return ONE complete HTML document starting with <!DOCTYPE html>",
    "Put all CSS in a <style> tag in the <head> and any JavaScript in a <script> tag before </body>",
    "Do not wrap the document in Markdown code fences and do not add commentary",
];

fn bullet_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Composes the generation brief from independent parts.
pub struct PromptBuilder<'a> {
    profile: &'a BusinessProfile,
    images: &'a ImageSet,
    variant: Variant,
    business_type: Option<&'a str>,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(profile: &'a BusinessProfile, images: &'a ImageSet, variant: Variant) -> Self {
        Self { profile, images, variant, business_type: None }
    }

    pub fn business_type(mut self, hint: Option<&'a str>) -> Self {
        self.business_type = hint.map(str::trim).filter(|h| !h.is_empty());
        self
    }

    pub fn preamble(&self) -> String {
        format!(
            "You are an expert web designer and copywriter. Create a complete, production-ready, single-page website for \"{}\".",
            self.profile.name
        )
    }

    pub fn business_facts(&self) -> String {
        let mut out = String::from("BUSINESS DETAILS:\n");
        if let Some(kind) = self.business_type {
            out.push_str(&format!("- Business type: {}\n", kind));
        }
        for field in Field::ALL {
            out.push_str(&format!("- {}: {}\n", field.label(), self.profile.get(field)));
        }
        out.trim_end().to_string()
    }

    pub fn design_preset(&self) -> String {
        let preset = self.variant.preset();
        format!(
            "DESIGN VARIANT {}: {}\n- Visual style: {}\n- Layout: {}\n- Blend the preset with the customer's preferred style: {}",
            self.variant.number(),
            preset.name,
            preset.visual_style,
            preset.layout,
            self.profile.style
        )
    }

    pub fn image_brief(&self) -> String {
        let mut out = format!(
            "IMAGES ({} total). You MUST use every one of these exact URLs in the page:\n",
            self.images.len()
        );
        for (idx, url) in self.images.urls().iter().enumerate() {
            let role = if idx == 0 { " (HERO background)" } else { "" };
            out.push_str(&format!("{}. {}{}\n", idx + 1, url, role));
        }
        out.push_str("Do not substitute, skip or invent image URLs.");
        out
    }

    pub fn section_requirements(&self) -> String {
        format!("REQUIRED SECTIONS:\n{}", bullet_list(SECTION_REQUIREMENTS))
    }

    pub fn visual_effects(&self) -> String {
        format!("VISUAL EFFECTS:\n{}", bullet_list(VISUAL_EFFECTS))
    }

    pub fn authenticity_rules(&self) -> String {
        format!("AUTHENTICITY:\n{}", bullet_list(AUTHENTICITY_RULES))
    }

    pub fn output_rules(&self) -> String {
        format!(
            "OUTPUT FORMAT:\n{}\n- The primary button text should reflect: {}",
            bullet_list(OUTPUT_RULES),
            self.profile.call_to_action
        )
    }

    pub fn build(&self) -> String {
        [
            self.preamble(),
            self.business_facts(),
            self.design_preset(),
            self.image_brief(),
            self.section_requirements(),
            self.visual_effects(),
            self.authenticity_rules(),
            self.output_rules(),
        ].join("\n\n")
    }
}
