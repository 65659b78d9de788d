//! Website text normalizer.
//!
//! Scraped page text is noisy: navigation bars repeat on every page,
//! footers carry copyright lines, and contact details leak into the body.
//! [`Normalizer`] strips that noise down to prose worth indexing:
//! whitespace runs collapse to single spaces, configured boilerplate
//! phrases are removed case-insensitively, URLs/emails/phone-like digit
//! runs are dropped, and sentence lines that are too short or duplicated
//! within the page are filtered out.
//!
//! Normalization never fails: empty or junk-only input yields an empty
//! string and the caller decides what that means.

use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use crate::config::CleaningConfig;

pub struct Normalizer {
    whitespace: Regex,
    urls: Regex,
    emails: Regex,
    digit_runs: Regex,
    boilerplate: Vec<Regex>,
    min_line_len: usize,
}

impl Normalizer {
    pub fn new(config: &CleaningConfig) -> Result<Self> {
        let mut boilerplate = Vec::with_capacity(config.boilerplate_patterns.len());
        for pattern in &config.boilerplate_patterns {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("invalid boilerplate pattern '{pattern}'"))?;
            boilerplate.push(re);
        }

        Ok(Self {
            whitespace: Regex::new(r"\s+").context("whitespace pattern")?,
            urls: Regex::new(r"http\S+").context("url pattern")?,
            emails: Regex::new(r"\S+@\S+").context("email pattern")?,
            digit_runs: Regex::new(r"\+?\d[\d\s]{7,}").context("digit-run pattern")?,
            boilerplate,
            min_line_len: config.min_line_len,
        })
    }

    /// Clean raw page text into deduplicated prose.
    pub fn normalize(&self, raw: &str) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }

        let mut text = self.whitespace.replace_all(raw, " ").into_owned();
        for pattern in &self.boilerplate {
            text = pattern.replace_all(&text, " ").into_owned();
        }
        text = self.urls.replace_all(&text, " ").into_owned();
        text = self.emails.replace_all(&text, " ").into_owned();
        text = self.digit_runs.replace_all(&text, " ").into_owned();

        let mut seen: HashSet<String> = HashSet::new();
        let mut kept: Vec<&str> = Vec::new();

        for line in text.split('.') {
            let line = line.trim();
            if line.chars().count() < self.min_line_len {
                continue;
            }
            if !seen.insert(line.to_lowercase()) {
                continue;
            }
            kept.push(line);
        }

        kept.join(". ").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(&CleaningConfig::default()).unwrap()
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let n = normalizer();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize("   \n\t  "), "");
    }

    #[test]
    fn collapses_whitespace_runs() {
        let n = normalizer();
        let out = n.normalize(
            "Rust   is a systems\n\nprogramming language that runs fast.  It prevents   segfaults and guarantees thread safety.",
        );
        assert!(out.contains("Rust is a systems programming language that runs fast"));
        assert!(!out.contains("  "));
    }

    #[test]
    fn strips_boilerplate_phrases_case_insensitively() {
        let n = normalizer();
        let out = n.normalize(
            "PRIVACY POLICY all rights reserved © 2024. Our team builds reliable embedded controllers for industrial machines.",
        );
        assert!(!out.to_lowercase().contains("privacy policy"));
        assert!(!out.to_lowercase().contains("all rights reserved"));
        assert!(out.contains("reliable embedded controllers"));
    }

    #[test]
    fn strips_urls_emails_and_phone_numbers() {
        let n = normalizer();
        let out = n.normalize(
            "Contact us at sales@example.com or +1 555 123 4567 via https://example.com/contact today. The support team answers most questions within one business day.",
        );
        assert!(!out.contains('@'));
        assert!(!out.contains("http"));
        assert!(!out.contains("555"));
        assert!(out.contains("support team"));
    }

    #[test]
    fn drops_short_junk_lines() {
        let n = normalizer();
        let out = n.normalize("Menu. Home. The quick brown fox jumps over the lazy dog every day.");
        assert!(!out.contains("Menu"));
        assert!(!out.contains("Home"));
        assert!(out.contains("quick brown fox"));
    }

    #[test]
    fn drops_case_insensitive_duplicate_lines() {
        let n = normalizer();
        let sentence = "The quick brown fox jumps over the lazy dog";
        let raw = format!("{sentence}. {}. final tail", sentence.to_uppercase());
        let out = n.normalize(&raw);
        assert_eq!(out.matches("quick brown fox").count() + out.matches("QUICK BROWN FOX").count(), 1);
    }
}
