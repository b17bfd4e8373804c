/// Stock images used when a request carries no usable image references.
pub const FALLBACK_IMAGES: [&str; 2] = [
    "https://images.unsplash.com/photo-1497366216548-37526070297c?w=1600&q=80",
    "https://images.unsplash.com/photo-1497366811353-6870744d04b2?w=1600&q=80",
];

/// Ordered image references in upload order. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSet {
    urls: Vec<String>,
    fallback: bool,
}

impl ImageSet {
    pub fn new<I, S>(urls: I) -> Self
        where I: IntoIterator<Item = S>, S: AsRef<str>
    {
        let urls: Vec<String> = urls
            .into_iter()
            .map(|u| u.as_ref().trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();

        if urls.is_empty() {
            return Self {
                urls: FALLBACK_IMAGES.iter().map(|u| u.to_string()).collect(),
                fallback: true,
            };
        }
        Self { urls, fallback: false }
    }

    pub fn hero(&self) -> &str {
        // `new` guarantees at least one entry.
        &self.urls[0]
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}
