//! Persona configuration.
//!
//! A persona is everything that differs between assistant variants on the
//! site: the instructions sent ahead of every conversation, the synthetic
//! acknowledgement, the greeting, the fallback text and the booking
//! heuristics.

/// The default booking marker.
pub const DEFAULT_MARKER: &str = "[BOOK_ACTION]";

const DEFAULT_FALLBACK: &str = "Sorry, I hit a snag. Try asking differently?";
const DEFAULT_ACKNOWLEDGEMENT: &str = "Understood.";

/// Immutable persona settings, see [`PersonaConfigBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PersonaConfig {
    instructions: String,
    acknowledgement: String,
    greeting: Option<String>,
    fallback: String,
    marker: String,
    trigger_phrases: Vec<String>,
}

impl PersonaConfig {
    /// The "YourTradePartner" assistant shipped with the site.
    pub fn trade_partner() -> Self {
        let instructions = include_str!("./persona/trade_partner.md")
            .replace("{{MARKER}}", DEFAULT_MARKER);
        PersonaConfigBuilder::with_instructions(instructions)
            .with_acknowledgement(
                "Understood. I will act as the YourTradePartner assistant, \
                 keeping answers under 30 words and using the specific data \
                 provided.",
            )
            .with_greeting(
                "G'day! Want to know how to get more high-value jobs? Ask me \
                 anything.",
            )
            .with_trigger_phrase("missed job review")
            .with_trigger_phrase("strategy session")
            .build()
    }

    /// Returns the instructions.
    #[inline]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Returns the synthetic acknowledgement of the instructions.
    #[inline]
    pub fn acknowledgement(&self) -> &str {
        &self.acknowledgement
    }

    /// Returns the message the transcript is seeded with.
    #[inline]
    pub fn greeting(&self) -> Option<&str> {
        self.greeting.as_deref()
    }

    /// Returns the message shown when a turn fails.
    #[inline]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Returns the booking marker.
    #[inline]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Returns the lowercased trigger phrases.
    #[inline]
    pub fn trigger_phrases(&self) -> &[String] {
        &self.trigger_phrases
    }
}

/// Builder for [`PersonaConfig`].
#[derive(Clone, Debug)]
pub struct PersonaConfigBuilder {
    instructions: String,
    acknowledgement: Option<String>,
    greeting: Option<String>,
    fallback: Option<String>,
    marker: Option<String>,
    trigger_phrases: Vec<String>,
}

impl PersonaConfigBuilder {
    /// Creates a builder with the given instructions.
    #[inline]
    pub fn with_instructions<S: Into<String>>(instructions: S) -> Self {
        Self {
            instructions: instructions.into(),
            acknowledgement: None,
            greeting: None,
            fallback: None,
            marker: None,
            trigger_phrases: vec![],
        }
    }

    /// Sets the acknowledgement turn that follows the instructions.
    #[inline]
    pub fn with_acknowledgement<S: Into<String>>(mut self, ack: S) -> Self {
        self.acknowledgement = Some(ack.into());
        self
    }

    /// Seeds every new transcript with this assistant message.
    #[inline]
    pub fn with_greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Overrides the message shown when a turn fails.
    #[inline]
    pub fn with_fallback<S: Into<String>>(mut self, fallback: S) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// Overrides the booking marker. An empty marker disables stripping.
    #[inline]
    pub fn with_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.marker = Some(marker.into());
        self
    }

    /// Adds a phrase that shows the booking affordance when a reply
    /// mentions it. Matching is case-insensitive.
    #[inline]
    pub fn with_trigger_phrase<S: Into<String>>(mut self, phrase: S) -> Self {
        self.trigger_phrases.push(phrase.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> PersonaConfig {
        let trigger_phrases = self
            .trigger_phrases
            .into_iter()
            .map(|phrase| phrase.trim().to_lowercase())
            .filter(|phrase| !phrase.is_empty())
            .collect();
        PersonaConfig {
            instructions: self.instructions,
            acknowledgement: self
                .acknowledgement
                .unwrap_or_else(|| DEFAULT_ACKNOWLEDGEMENT.to_owned()),
            greeting: self.greeting,
            fallback: self
                .fallback
                .unwrap_or_else(|| DEFAULT_FALLBACK.to_owned()),
            marker: self.marker.unwrap_or_else(|| DEFAULT_MARKER.to_owned()),
            trigger_phrases,
        }
    }
}
