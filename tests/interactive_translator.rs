use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;

use interactive_mt::{
    ErrorCorrectionModel, InteractiveTranslationEngine, InteractiveTranslator,
    InteractiveTranslatorFactory, PhraseTranslationSuggester, Range, TranslationEngine,
    TranslationError, TranslationResult, TranslationSources, TranslationSuggester,
    WhitespaceDetokenizer, WordAlignmentMatrix, WordGraph, WordGraphArc, MAX_SEGMENT_LENGTH,
};
use interactive_mt::decoder::ErrorCorrectionWordGraphProcessor;

const SOURCE_SEGMENT: &str = "En el principio la Palabra ya existía .";

#[derive(Debug, Deserialize)]
struct WordGraphData {
    source_tokens: Vec<String>,
    initial_state_score: f64,
    final_states: Vec<usize>,
    arcs: Vec<ArcData>,
}

#[derive(Debug, Deserialize)]
struct ArcData {
    prev_state: usize,
    next_state: usize,
    score: f64,
    tokens: Vec<String>,
    confidences: Vec<f64>,
    source_segment_range: (usize, usize),
    is_unknown: bool,
    alignment: Vec<(usize, usize)>,
}

fn build_arc(data: ArcData) -> WordGraphArc {
    let range = Range::new(data.source_segment_range.0, data.source_segment_range.1);
    let token_count = data.tokens.len();
    let source = if data.is_unknown {
        TranslationSources::NONE
    } else {
        TranslationSources::SMT
    };
    WordGraphArc::new(
        data.prev_state,
        data.next_state,
        data.score,
        data.tokens,
        WordAlignmentMatrix::from_pairs(range.len(), token_count, &data.alignment),
        range,
        vec![source; token_count],
        data.confidences,
    )
}

fn reference_word_graph() -> WordGraph {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("word_graph.json");
    let file = File::open(path).expect("word graph test data should exist");
    let data: WordGraphData =
        serde_json::from_reader(BufReader::new(file)).expect("word graph data should parse");
    let arcs = data.arcs.into_iter().map(build_arc).collect();
    WordGraph::new(
        data.source_tokens,
        arcs,
        data.final_states,
        data.initial_state_score,
    )
}

fn simple_word_graph() -> WordGraph {
    let source_tokens: Vec<String> =
        SOURCE_SEGMENT.split(' ').map(|t| t.to_string()).collect();
    let smt = |tokens: &[&str], confidences: &[f64]| {
        (
            tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
            confidences.to_vec(),
        )
    };
    let diagonal = |n: usize| {
        let pairs: Vec<(usize, usize)> = (0..n).map(|i| (i, i)).collect();
        WordAlignmentMatrix::from_pairs(n, n, &pairs)
    };
    let arc = |prev, next, score, (tokens, confidences): (Vec<String>, Vec<f64>), range: Range, unknown: bool| {
        let n = tokens.len();
        let source = if unknown {
            TranslationSources::NONE
        } else {
            TranslationSources::SMT
        };
        WordGraphArc::new(
            prev,
            next,
            score,
            tokens,
            diagonal(n),
            range,
            vec![source; n],
            confidences,
        )
    };
    WordGraph::new(
        source_tokens,
        vec![
            arc(0, 1, -10.0, smt(&["In", "the", "beginning"], &[0.5, 0.5, 0.5]), Range::new(0, 3), false),
            arc(0, 1, -11.0, smt(&["In", "the", "start"], &[0.5, 0.5, 0.4]), Range::new(0, 3), false),
            arc(1, 2, -10.0, smt(&["the", "Word"], &[0.5, 0.5]), Range::new(3, 5), false),
            arc(1, 2, -11.0, smt(&["his", "Word"], &[0.4, 0.5]), Range::new(3, 5), false),
            arc(2, 3, -10.0, smt(&["already"], &[0.5]), Range::new(5, 6), false),
            arc(3, 4, 50.0, smt(&["existía"], &[0.0]), Range::new(6, 7), true),
            arc(4, 5, -10.0, smt(&["."], &[0.5]), Range::new(7, 8), false),
        ],
        [5],
        0.0,
    )
}

struct MockEngine {
    word_graph: Option<WordGraph>,
    train_calls: Mutex<Vec<(Vec<String>, Vec<String>, bool)>>,
}

impl MockEngine {
    fn with_graph(word_graph: WordGraph) -> Arc<Self> {
        Arc::new(Self {
            word_graph: Some(word_graph),
            train_calls: Mutex::new(Vec::new()),
        })
    }

    fn without_graph() -> Arc<Self> {
        Arc::new(Self {
            word_graph: None,
            train_calls: Mutex::new(Vec::new()),
        })
    }

    fn train_calls(&self) -> Vec<(Vec<String>, Vec<String>, bool)> {
        self.train_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslationEngine for MockEngine {
    async fn translate(&self, _segment: &[String]) -> Result<TranslationResult, TranslationError> {
        Err(TranslationError::engine("translating", "not supported by the mock engine"))
    }

    async fn translate_n_best(
        &self,
        _n: usize,
        _segment: &[String],
    ) -> Result<Vec<TranslationResult>, TranslationError> {
        Err(TranslationError::engine("translating", "not supported by the mock engine"))
    }
}

#[async_trait]
impl InteractiveTranslationEngine for MockEngine {
    async fn get_word_graph(&self, segment: &[String]) -> Result<WordGraph, TranslationError> {
        match &self.word_graph {
            Some(graph) => Ok(graph.clone()),
            None => Ok(WordGraph::empty(segment.to_vec())),
        }
    }

    async fn train_segment(
        &self,
        source_tokens: &[String],
        target_tokens: &[String],
        sentence_start: bool,
    ) -> Result<(), TranslationError> {
        self.train_calls.lock().unwrap().push((
            source_tokens.to_vec(),
            target_tokens.to_vec(),
            sentence_start,
        ));
        Ok(())
    }
}

async fn create_translator(engine: Arc<MockEngine>) -> InteractiveTranslator {
    let factory = InteractiveTranslatorFactory::new(engine);
    factory
        .create(SOURCE_SEGMENT, true)
        .await
        .expect("session creation should succeed")
}

fn first_translation(translator: &InteractiveTranslator) -> String {
    translator
        .current_results()
        .next()
        .expect("at least one result")
        .translation
}

fn to_tokens(text: &str) -> Vec<String> {
    text.split(' ').map(|t| t.to_string()).collect()
}

#[tokio::test]
async fn empty_prefix() {
    let translator = create_translator(MockEngine::with_graph(reference_word_graph())).await;
    assert_eq!(
        first_translation(&translator),
        "In the beginning the Word already existía ."
    );
}

#[tokio::test]
async fn add_one_complete_word_to_prefix() {
    let mut translator = create_translator(MockEngine::with_graph(reference_word_graph())).await;
    translator.append_to_prefix("In ");
    assert_eq!(
        first_translation(&translator),
        "In the beginning the Word already existía ."
    );
}

#[tokio::test]
async fn add_one_partial_word_to_prefix() {
    let mut translator = create_translator(MockEngine::with_graph(reference_word_graph())).await;
    translator.append_to_prefix("In ");
    translator.append_to_prefix("t");
    assert!(!translator.is_last_word_complete());
    assert_eq!(
        first_translation(&translator),
        "In the beginning the Word already existía ."
    );
}

#[tokio::test]
async fn force_last_word_to_be_complete() {
    let mut translator = create_translator(MockEngine::with_graph(reference_word_graph())).await;
    translator.set_prefix_tokens(
        to_tokens("In the beginning the Word already exist"),
        true,
    );
    assert_eq!(
        first_translation(&translator),
        "In the beginning the Word already exist ."
    );
}

#[tokio::test]
async fn remove_one_word_from_prefix() {
    let mut translator = create_translator(MockEngine::with_graph(reference_word_graph())).await;
    translator.append_to_prefix("In the beginning ");
    translator.set_prefix("In the ");
    assert_eq!(
        first_translation(&translator),
        "In the beginning the Word already existía ."
    );
}

#[tokio::test]
async fn remove_entire_prefix() {
    let mut translator = create_translator(MockEngine::with_graph(reference_word_graph())).await;
    translator.append_to_prefix("In the beginning ");
    translator.set_prefix("");
    assert_eq!(
        first_translation(&translator),
        "In the beginning the Word already existía ."
    );
}

#[tokio::test]
async fn incremental_and_fresh_prefixes_agree() {
    let mut incremental =
        create_translator(MockEngine::with_graph(reference_word_graph())).await;
    incremental.append_to_prefix("In ");
    incremental.append_to_prefix("the ");
    incremental.append_to_prefix("beginning ");

    let mut fresh = create_translator(MockEngine::with_graph(reference_word_graph())).await;
    fresh.set_prefix("In the beginning ");

    assert_eq!(first_translation(&incremental), first_translation(&fresh));
}

#[tokio::test]
async fn results_are_deterministic() {
    let translator = create_translator(MockEngine::with_graph(reference_word_graph())).await;
    assert_eq!(first_translation(&translator), first_translation(&translator));
}

#[tokio::test]
async fn source_segment_valid() {
    let translator = create_translator(MockEngine::with_graph(reference_word_graph())).await;
    assert!(translator.is_source_segment_valid());
}

#[tokio::test]
async fn source_segment_invalid() {
    let mut source_tokens = vec!["word"; MAX_SEGMENT_LENGTH];
    source_tokens.push(".");
    let segment = source_tokens.join(" ");

    let factory = InteractiveTranslatorFactory::new(MockEngine::without_graph());
    let translator = factory
        .create(&segment, true)
        .await
        .expect("session creation should succeed");
    assert!(!translator.is_source_segment_valid());
}

#[tokio::test]
async fn approve_aligned_only() {
    let engine = MockEngine::with_graph(reference_word_graph());
    let mut translator = create_translator(Arc::clone(&engine)).await;
    translator.append_to_prefix("In the beginning ");
    translator.approve(true).await.expect("approve should succeed");

    let calls = engine.train_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, to_tokens("En el principio"));
    assert_eq!(calls[0].1, to_tokens("In the beginning"));
    assert!(calls[0].2);

    translator.append_to_prefix("the Word already existed .");
    translator.approve(true).await.expect("approve should succeed");

    let calls = engine.train_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].0, to_tokens("En el principio la Palabra ya existía ."));
    assert_eq!(
        calls[1].1,
        to_tokens("In the beginning the Word already existed .")
    );
}

#[tokio::test]
async fn approve_whole_source_segment() {
    let engine = MockEngine::with_graph(reference_word_graph());
    let mut translator = create_translator(Arc::clone(&engine)).await;
    translator.append_to_prefix("In the beginning ");
    translator.approve(false).await.expect("approve should succeed");

    let calls = engine.train_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, to_tokens("En el principio la Palabra ya existía ."));
    assert_eq!(calls[0].1, to_tokens("In the beginning"));
}

#[tokio::test]
async fn approve_skips_oversized_segment() {
    let mut source_tokens = vec!["word"; MAX_SEGMENT_LENGTH];
    source_tokens.push(".");
    let segment = source_tokens.join(" ");

    let engine = MockEngine::without_graph();
    let factory = InteractiveTranslatorFactory::new(engine.clone());
    let mut translator = factory
        .create(&segment, true)
        .await
        .expect("session creation should succeed");
    translator.append_to_prefix("something ");
    translator.approve(false).await.expect("approve should succeed");
    assert!(engine.train_calls().is_empty());
}

#[tokio::test]
async fn multiple_results_empty_prefix() {
    let translator = create_translator(MockEngine::with_graph(simple_word_graph())).await;
    let translations: Vec<String> = translator
        .current_results()
        .take(2)
        .map(|r| r.translation)
        .collect();
    assert_eq!(
        translations,
        vec![
            "In the beginning the Word already existía .",
            "In the start the Word already existía .",
        ]
    );
}

#[tokio::test]
async fn multiple_results_nonempty_prefix() {
    let mut translator = create_translator(MockEngine::with_graph(simple_word_graph())).await;

    translator.append_to_prefix("In the ");
    let translations: Vec<String> = translator
        .current_results()
        .take(2)
        .map(|r| r.translation)
        .collect();
    assert_eq!(
        translations,
        vec![
            "In the beginning the Word already existía .",
            "In the start the Word already existía .",
        ]
    );

    translator.append_to_prefix("beginning ");
    let translations: Vec<String> = translator
        .current_results()
        .take(2)
        .map(|r| r.translation)
        .collect();
    assert_eq!(
        translations,
        vec![
            "In the beginning the Word already existía .",
            "In the beginning his Word already existía .",
        ]
    );
}

#[tokio::test]
async fn empty_word_graph_yields_the_prefix() {
    let factory = InteractiveTranslatorFactory::new(MockEngine::without_graph());
    let mut translator = factory
        .create(SOURCE_SEGMENT, true)
        .await
        .expect("session creation should succeed");
    translator.append_to_prefix("In the ");

    let results: Vec<TranslationResult> = translator.current_results().collect();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].translation, "In the");
    assert!(results[0]
        .sources
        .iter()
        .all(|&s| s == TranslationSources::PREFIX));
}

#[tokio::test]
async fn suggester_stops_before_untranslated_word() {
    let mut translator = create_translator(MockEngine::with_graph(reference_word_graph())).await;
    translator.append_to_prefix("In the ");

    let suggester = PhraseTranslationSuggester::new(0.2);
    let suggestions = suggester.get_suggestions(
        1,
        translator.prefix_word_ranges().len(),
        translator.is_last_word_complete(),
        &mut translator.current_results(),
    );
    assert_eq!(suggestions.len(), 1);
    assert_eq!(
        suggestions[0].target_words(),
        vec!["beginning", "the", "Word", "already"]
    );
}

#[test]
fn pruned_arcs_are_skipped_in_search() {
    let mut processor = ErrorCorrectionWordGraphProcessor::new(
        Arc::new(ErrorCorrectionModel::new()),
        Arc::new(WhitespaceDetokenizer),
        Arc::new(simple_word_graph()),
    );
    processor.confidence_threshold = 0.45;
    processor.correct(&[], true);

    let translations: Vec<String> = processor
        .results()
        .take(10)
        .map(|r| r.translation)
        .collect();
    assert!(!translations.is_empty());
    assert_eq!(
        translations[0],
        "In the beginning the Word already existía ."
    );
    for translation in &translations {
        assert!(!translation.contains("start"));
        assert!(!translation.contains("his"));
    }
}
