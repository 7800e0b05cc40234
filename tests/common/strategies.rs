#![allow(dead_code)]

use proptest::prelude::*;
use publishing_core::models::{Description, DescriptionType, Language, ServiceContent};
use uuid::Uuid;

/// Strategy for generating content language codes
pub fn language_strategy() -> impl Strategy<Value = Language> {
    prop::sample::select(vec!["fi", "sv", "en", "se", "smn"]).prop_map(Language::new)
}

pub fn description_strategy() -> impl Strategy<Value = Description> {
    (
        language_strategy(),
        prop::sample::select(vec![
            DescriptionType::ShortDescription,
            DescriptionType::Description,
            DescriptionType::UserInstruction,
        ]),
        "[a-zA-Z ]{0,24}",
    )
        .prop_map(|(language, description_type, text)| Description::new(language, description_type, text))
}

/// Service content with every checked field independently present or missing
pub fn service_content_strategy() -> impl Strategy<Value = ServiceContent> {
    (
        any::<bool>(),
        prop::collection::vec(description_strategy(), 0..6),
        prop::collection::vec(language_strategy(), 0..3),
        0usize..3,
    )
        .prop_map(|(has_funding, descriptions, languages, target_groups)| ServiceContent {
            funding_type_id: has_funding.then(Uuid::new_v4),
            descriptions,
            languages,
            target_groups: (0..target_groups).map(|_| Uuid::new_v4()).collect(),
            ..Default::default()
        })
}

/// One to three distinct language codes with names
pub fn named_languages_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::sample::subsequence(vec!["fi", "sv", "en"], 1..=3).prop_flat_map(|codes| {
        let count = codes.len();
        prop::collection::vec("[A-Za-z]{0,12}", count).prop_map(move |names| {
            codes
                .iter()
                .map(|code| code.to_string())
                .zip(names)
                .collect()
        })
    })
}
