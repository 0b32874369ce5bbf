//! Card catalog for definition lookup.
//!
//! The `CardCatalog` stores every card definition, indexed by id, by rarity
//! and by series. Cards keep their declaration order everywhere, so a
//! uniform pick driven by a fixed draw sequence always lands on the same
//! card.

use rustc_hash::FxHashMap;

use super::definition::{CardDefinition, CardId};
use super::rarity::Rarity;
use crate::error::ConfigError;

/// A named group of cards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Series {
    pub name: String,
    cards: Vec<usize>,
}

/// Registry of card definitions.
///
/// ## Example
///
/// ```
/// use card_arena::cards::{CardCatalog, CardDefinition, CardId, Rarity};
///
/// let mut catalog = CardCatalog::new();
/// catalog
///     .register(CardDefinition::new("slime", "Slime", Rarity::Common).in_series("Starter"))
///     .unwrap();
///
/// let found = catalog.get(&CardId::new("slime")).unwrap();
/// assert_eq!(found.name, "Slime");
/// assert_eq!(catalog.in_tier(Rarity::Common).count(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardCatalog {
    cards: Vec<CardDefinition>,
    by_id: FxHashMap<CardId, usize>,
    by_rarity: [Vec<usize>; Rarity::COUNT],
    series: Vec<Series>,
}

impl CardCatalog {
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a card definition.
    ///
    /// Fails if a card with the same id already exists.
    pub fn register(&mut self, card: CardDefinition) -> Result<(), ConfigError> {
        if self.by_id.contains_key(&card.id) {
            return Err(ConfigError::DuplicateCard(card.id));
        }

        let index = self.cards.len();
        self.by_id.insert(card.id.clone(), index);
        self.by_rarity[card.rarity.index()].push(index);

        match self.series.iter_mut().find(|s| s.name == card.series) {
            Some(series) => series.cards.push(index),
            None => self.series.push(Series {
                name: card.series.clone(),
                cards: vec![index],
            }),
        }

        self.cards.push(card);
        Ok(())
    }

    /// Get a card definition by id.
    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<&CardDefinition> {
        self.by_id.get(id).map(|&i| &self.cards[i])
    }

    /// Check if a card id is registered.
    #[must_use]
    pub fn contains(&self, id: &CardId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Get the number of registered cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over all cards in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &CardDefinition> {
        self.cards.iter()
    }

    /// Cards of one rarity, in declaration order.
    pub fn in_tier(&self, rarity: Rarity) -> impl Iterator<Item = &CardDefinition> {
        self.by_rarity[rarity.index()].iter().map(|&i| &self.cards[i])
    }

    /// Number of cards of one rarity.
    #[must_use]
    pub fn tier_len(&self, rarity: Rarity) -> usize {
        self.by_rarity[rarity.index()].len()
    }

    /// The `n`th card of a rarity tier, in declaration order.
    #[must_use]
    pub fn nth_in_tier(&self, rarity: Rarity, n: usize) -> Option<&CardDefinition> {
        self.by_rarity[rarity.index()].get(n).map(|&i| &self.cards[i])
    }

    /// Series names in declaration order.
    pub fn series_names(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.name.as_str())
    }

    /// Cards of one series, in declaration order.
    pub fn in_series<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CardDefinition> + 'a {
        self.series
            .iter()
            .filter(move |s| s.name == name)
            .flat_map(move |s| s.cards.iter().map(move |&i| &self.cards[i]))
    }

    /// Find cards matching a predicate.
    pub fn find<F>(&self, predicate: F) -> impl Iterator<Item = &CardDefinition>
    where
        F: Fn(&CardDefinition) -> bool,
    {
        self.cards.iter().filter(move |c| predicate(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, rarity: Rarity, series: &str) -> CardDefinition {
        CardDefinition::new(id, id.to_uppercase(), rarity).in_series(series)
    }

    #[test]
    fn test_register_and_get() {
        let mut catalog = CardCatalog::new();
        catalog.register(card("a", Rarity::Common, "S1")).unwrap();

        let found = catalog.get(&CardId::new("a"));
        assert!(found.is_some());
        assert_eq!(found.unwrap().name, "A");

        assert!(catalog.get(&CardId::new("zz")).is_none());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut catalog = CardCatalog::new();
        catalog.register(card("a", Rarity::Common, "S1")).unwrap();

        let err = catalog.register(card("a", Rarity::Rare, "S2")).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCard(id) if id.as_str() == "a"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_tier_index_keeps_declaration_order() {
        let mut catalog = CardCatalog::new();
        catalog.register(card("c1", Rarity::Common, "S1")).unwrap();
        catalog.register(card("r1", Rarity::Rare, "S1")).unwrap();
        catalog.register(card("c2", Rarity::Common, "S2")).unwrap();

        let commons: Vec<_> = catalog.in_tier(Rarity::Common).map(|c| c.id.as_str()).collect();
        assert_eq!(commons, vec!["c1", "c2"]);
        assert_eq!(catalog.tier_len(Rarity::Rare), 1);
        assert_eq!(catalog.tier_len(Rarity::Epic), 0);
        assert_eq!(catalog.nth_in_tier(Rarity::Common, 1).map(|c| c.id.as_str()), Some("c2"));
        assert!(catalog.nth_in_tier(Rarity::Common, 2).is_none());
    }

    #[test]
    fn test_series_grouping() {
        let mut catalog = CardCatalog::new();
        catalog.register(card("a", Rarity::Common, "Forest")).unwrap();
        catalog.register(card("b", Rarity::Rare, "Sea")).unwrap();
        catalog.register(card("c", Rarity::Epic, "Forest")).unwrap();

        let names: Vec<_> = catalog.series_names().collect();
        assert_eq!(names, vec!["Forest", "Sea"]);

        let forest: Vec<_> = catalog.in_series("Forest").map(|c| c.id.as_str()).collect();
        assert_eq!(forest, vec!["a", "c"]);
        assert_eq!(catalog.in_series("Desert").count(), 0);
    }

    #[test]
    fn test_find_with_predicate() {
        let mut catalog = CardCatalog::new();
        catalog.register(card("a", Rarity::Common, "S")).unwrap();
        catalog.register(card("b", Rarity::Legendary, "S")).unwrap();

        let shiny: Vec<_> = catalog.find(|c| c.rarity.is_rare_or_better()).collect();
        assert_eq!(shiny.len(), 1);
        assert_eq!(shiny[0].id.as_str(), "b");
    }
}
