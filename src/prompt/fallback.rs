use super::images::ImageSet;
use crate::profile::BusinessProfile;

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Self-contained page rendered locally whenever the oracle output can't be used.
pub fn fallback_document(profile: &BusinessProfile, images: &ImageSet) -> String {
    let name = escape_html(&profile.name);
    let description = escape_html(&profile.description);
    let services = escape_html(&profile.services);
    let audience = escape_html(&profile.target_audience);
    let location = escape_html(&profile.location);
    let contact = escape_html(&profile.contact);
    let cta = escape_html(&profile.call_to_action);
    let phone = escape_html(&profile.phone);
    let email = escape_html(&profile.email);
    let address = escape_html(&profile.address);
    let hero = escape_html(images.hero());

    let gallery = images
        .urls()
        .iter()
        .skip(1)
        .map(|url| format!("      <img src=\"{}\" alt=\"{}\" loading=\"lazy\">", escape_html(url), name))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{name}</title>
  <style>
    * {{ box-sizing: border-box; margin: 0; padding: 0; }}
    body {{ font-family: "Helvetica Neue", Arial, sans-serif; color: #1f2933; line-height: 1.6; }}
    nav {{ position: sticky; top: 0; background: #ffffff; padding: 1rem 2rem; box-shadow: 0 2px 8px rgba(0,0,0,0.08); z-index: 10; }}
    nav strong {{ font-size: 1.25rem; }}
    .hero {{ min-height: 80vh; display: flex; align-items: center; justify-content: center; text-align: center; color: #ffffff;
      background: linear-gradient(rgba(0,0,0,0.55), rgba(0,0,0,0.55)), url("{hero}") center / cover no-repeat; padding: 2rem; }}
    .hero h1 {{ font-size: 3rem; margin-bottom: 1rem; }}
    .button {{ display: inline-block; margin-top: 1.5rem; padding: 0.9rem 2rem; background: #2563eb; color: #ffffff; border-radius: 999px; text-decoration: none; }}
    section {{ padding: 4rem 2rem; max-width: 1100px; margin: 0 auto; }}
    h2 {{ font-size: 2rem; margin-bottom: 1rem; }}
    .gallery {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(240px, 1fr)); gap: 1rem; }}
    .gallery img {{ width: 100%; height: 220px; object-fit: cover; border-radius: 12px; }}
    footer {{ background: #111827; color: #d1d5db; text-align: center; padding: 2rem; }}
  </style>
</head>
<body>
  <nav><strong>{name}</strong></nav>
  <header class="hero">
    <div>
      <h1>{name}</h1>
      <p>{description}</p>
      <a class="button" href="#contact">{cta}</a>
    </div>
  </header>
  <section id="services">
    <h2>What We Offer</h2>
    <p>{services}</p>
  </section>
  <section id="gallery">
    <div class="gallery">
{gallery}
    </div>
  </section>
  <section id="about">
    <h2>About Us</h2>
    <p>{description} Proudly serving {audience} in {location}.</p>
  </section>
  <section id="contact">
    <h2>Contact</h2>
    <p>{contact}</p>
    <p>Phone: <a href="tel:{phone}">{phone}</a></p>
    <p>Email: <a href="mailto:{email}">{email}</a></p>
    <p>Address: {address}</p>
  </section>
  <footer>&copy; {name}. All rights reserved.</footer>
</body>
</html>
"##
    )
}
