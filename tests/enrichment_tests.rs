use std::sync::atomic::Ordering;

use anki_vocab_backend::db::cards;
use anki_vocab_backend::services::enrichment::{CardOverrides, EnrichmentError, Stage};
use anki_vocab_backend::storage::{AudioRole, AudioStore};

mod common;

use common::{harness, harness_with, MockLexical, MockSpeech};

#[tokio::test]
async fn created_card_keeps_word_exactly() {
    let h = harness().await;
    let card = h
        .enricher
        .create_card("user-1", "dataset-1", "apple", &CardOverrides::default())
        .await
        .unwrap();
    assert_eq!(card.word, "apple");
}

#[tokio::test]
async fn scenario_a_full_generation() {
    let h = harness().await;
    let card = h
        .enricher
        .create_card("user-1", "dataset-1", "apple", &CardOverrides::default())
        .await
        .unwrap();

    assert_eq!(card.ipa_transcription.as_deref(), Some("/apple/"));
    assert!(card.meaning_en.as_deref().is_some_and(|m| !m.is_empty()));
    assert!(card.meaning_vi.as_deref().is_some_and(|m| !m.is_empty()));
    assert_eq!(card.example_sentences_en.len(), 2);
    assert_eq!(card.word_type.as_deref(), Some("noun"));
    assert!(!card.vocab_family.is_empty());

    // All three artifacts resolvable at their recorded locations.
    for (reference, role) in [
        (&card.audio_url_word, AudioRole::Word),
        (&card.audio_url_example1, AudioRole::Example1),
        (&card.audio_url_example2, AudioRole::Example2),
    ] {
        assert_eq!(reference.as_deref(), Some(h.audio.location(&card.id, role).as_str()));
        assert!(h.audio.exists(&card.id, role).await);
    }
}

#[tokio::test]
async fn scenario_b_override_skips_generation_stage() {
    let h = harness().await;
    let overrides = CardOverrides {
        meaning_en: Some("A fruit".to_string()),
        ..Default::default()
    };
    let card = h
        .enricher
        .create_card("user-1", "dataset-1", "apple", &overrides)
        .await
        .unwrap();

    assert_eq!(card.meaning_en.as_deref(), Some("A fruit"));
    // The English-meaning prompt never reached the generator.
    assert_eq!(h.generator.calls_matching("Define"), 0);
    // The other five generation prompts still ran.
    assert_eq!(h.generator.call_count(), 5);
}

#[tokio::test]
async fn scenario_c_no_synsets_still_succeeds() {
    let h = harness_with(MockLexical::new(Vec::new()), MockSpeech::new()).await;
    let card = h
        .enricher
        .create_card("user-1", "dataset-1", "blorptastic", &CardOverrides::default())
        .await
        .unwrap();

    assert!(card.synonyms.is_empty());
    assert!(card.antonyms.is_empty());
    assert!(card.audio_url_word.is_some());
}

#[tokio::test]
async fn scenario_d_audio_failure_leaves_retrievable_skeleton() {
    // The example-2 sentence is the one the default generator emits second.
    let h = harness_with(
        MockLexical::with_default_synsets(),
        MockSpeech::failing_for("She ate an apple for lunch."),
    )
    .await;

    let err = h
        .enricher
        .create_card("user-1", "dataset-1", "apple", &CardOverrides::default())
        .await
        .unwrap_err();

    assert_eq!(err.failed_stage(), Some(Stage::AudioExample2));

    let cards = cards::find_by_user(&h.db, "user-1").await.unwrap();
    assert_eq!(cards.len(), 1);
    let skeleton = &cards[0];
    assert!(skeleton.is_skeleton());

    let by_id = cards::find_by_id(&h.db, &skeleton.id).await.unwrap();
    assert!(by_id.is_some());
}

#[tokio::test]
async fn round_trip_preserves_every_field() {
    let h = harness().await;
    let created = h
        .enricher
        .create_card("user-1", "dataset-1", "apple", &CardOverrides::default())
        .await
        .unwrap();

    let fetched = cards::find_by_id(&h.db, &created.id).await.unwrap().unwrap();
    assert_eq!(created, fetched);
}

#[tokio::test]
async fn synonym_and_antonym_sets_are_deduplicated() {
    let h = harness().await;
    let card = h
        .enricher
        .create_card("user-1", "dataset-1", "apple", &CardOverrides::default())
        .await
        .unwrap();

    // "fresh" appears in two synsets but is stored once; each lemma
    // contributes only its first antonym, so "limp" never shows up.
    assert_eq!(card.synonyms, vec!["crisp", "fresh", "ripe"]);
    assert_eq!(card.antonyms, vec!["soggy", "stale"]);
}

#[tokio::test]
async fn empty_word_is_rejected_before_any_provider_call() {
    let h = harness().await;
    let err = h
        .enricher
        .create_card("user-1", "dataset-1", "   ", &CardOverrides::default())
        .await
        .unwrap_err();

    assert!(matches!(err, EnrichmentError::Validation(_)));
    assert_eq!(h.transcription.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.generator.call_count(), 0);
    assert_eq!(h.speech.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn delete_cascades_to_all_artifacts() {
    let h = harness().await;
    let card = h
        .enricher
        .create_card("user-1", "dataset-1", "apple", &CardOverrides::default())
        .await
        .unwrap();

    h.enricher.delete_card(&card.id).await.unwrap();

    assert!(cards::find_by_id(&h.db, &card.id).await.unwrap().is_none());
    for role in AudioRole::ALL {
        assert!(!h.audio.exists(&card.id, role).await);
    }
}

#[tokio::test]
async fn delete_retry_after_partial_failure_removes_artifacts() {
    let h = harness().await;
    let card = h
        .enricher
        .create_card("user-1", "dataset-1", "apple", &CardOverrides::default())
        .await
        .unwrap();

    // Record gone but artifacts left behind, as after an interrupted delete.
    cards::delete(&h.db, &card.id).await.unwrap();
    for role in AudioRole::ALL {
        assert!(h.audio.exists(&card.id, role).await);
    }

    let err = h.enricher.delete_card(&card.id).await.unwrap_err();
    assert!(matches!(err, EnrichmentError::NotFound));
    for role in AudioRole::ALL {
        assert!(!h.audio.exists(&card.id, role).await);
    }
}

#[tokio::test]
async fn delete_unknown_card_is_not_found() {
    let h = harness().await;
    let err = h.enricher.delete_card("no-such-id").await.unwrap_err();
    assert!(matches!(err, EnrichmentError::NotFound));
}

#[tokio::test]
async fn resume_enrichment_overwrites_same_locations() {
    let h = harness().await;
    let card = h
        .enricher
        .create_card("user-1", "dataset-1", "apple", &CardOverrides::default())
        .await
        .unwrap();

    let resumed = h.enricher.resume_enrichment(&card.id).await.unwrap();

    assert_eq!(resumed.audio_url_word, card.audio_url_word);
    assert_eq!(resumed.audio_url_example1, card.audio_url_example1);
    assert_eq!(resumed.audio_url_example2, card.audio_url_example2);
    for role in AudioRole::ALL {
        assert!(h.audio.exists(&card.id, role).await);
    }
}

#[tokio::test]
async fn stale_skeletons_are_discoverable_for_recovery() {
    let h = harness_with(
        MockLexical::with_default_synsets(),
        MockSpeech::failing_for("She ate an apple for lunch."),
    )
    .await;

    let _ = h
        .enricher
        .create_card("user-1", "dataset-1", "apple", &CardOverrides::default())
        .await
        .unwrap_err();

    // Cutoff in the far future: the fresh skeleton qualifies.
    let stale = cards::find_stale_skeletons(&h.db, "9999-01-01T00:00:00.000Z")
        .await
        .unwrap();
    assert_eq!(stale.len(), 1);
    assert!(stale[0].is_skeleton());

    // Cutoff in the past: nothing is stale yet.
    let stale = cards::find_stale_skeletons(&h.db, "2000-01-01T00:00:00.000Z")
        .await
        .unwrap();
    assert!(stale.is_empty());
}

#[tokio::test]
async fn updated_at_is_refreshed_and_monotonic() {
    let h = harness().await;
    let card = h
        .enricher
        .create_card("user-1", "dataset-1", "apple", &CardOverrides::default())
        .await
        .unwrap();

    // The artifact update at stage 7 already bumped updated_at past created_at.
    assert!(card.updated_at >= card.created_at);

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let changes = cards::UpdateCardFields {
        meaning_en: Some("A crisp orchard fruit.".into()),
        ..Default::default()
    };
    cards::update_fields(&h.db, &card.id, &changes).await.unwrap();

    let updated = cards::find_by_id(&h.db, &card.id).await.unwrap().unwrap();
    assert_eq!(updated.meaning_en.as_deref(), Some("A crisp orchard fruit."));
    assert!(updated.updated_at > card.updated_at);
}

#[tokio::test]
async fn preview_generates_without_persisting() {
    let h = harness().await;
    let preview = h
        .enricher
        .generate_preview("apple", &CardOverrides::default())
        .await
        .unwrap();

    assert_eq!(preview.word, "apple");
    assert_eq!(preview.ipa_transcription, "/apple/");
    assert_eq!(preview.example_sentences_en.len(), 2);
    assert!(!preview.audio_base64.is_empty());

    assert!(cards::find_by_user(&h.db, "user-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn example_overrides_skip_sentence_generation() {
    let h = harness().await;
    let overrides = CardOverrides {
        example_sentences_en: Some(vec![
            "An apple a day.".to_string(),
            "Green apples are sour.".to_string(),
        ]),
        example_sentences_vi: Some(vec!["Một quả táo mỗi ngày.".to_string()]),
        ..Default::default()
    };
    let card = h
        .enricher
        .create_card("user-1", "dataset-1", "apple", &overrides)
        .await
        .unwrap();

    assert_eq!(card.example_sentences_en[0], "An apple a day.");
    assert_eq!(h.generator.calls_matching("example sentences"), 0);

    // Audio is keyed to the supplied sentences.
    let example1 = h.audio.read(&card.id, AudioRole::Example1).await.unwrap();
    assert_eq!(&example1[..], b"mp3:An apple a day.");
}

#[tokio::test]
async fn fewer_than_two_example_overrides_is_a_validation_error() {
    let h = harness().await;
    let overrides = CardOverrides {
        example_sentences_en: Some(vec!["Only one sentence.".to_string()]),
        ..Default::default()
    };
    let err = h
        .enricher
        .create_card("user-1", "dataset-1", "apple", &overrides)
        .await
        .unwrap_err();

    assert!(matches!(err, EnrichmentError::Validation(_)));
}
