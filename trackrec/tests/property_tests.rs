//! Property tests for normalization, similarity and query results.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use regex::Regex;
use trackrec::{
    Catalog, DenseSimilarityMatrix, IndexStrategy, OnDemandIndex, Playlist, Recommender,
    RecommenderConfig, SimilarityIndex, Track, VectorSpace, VectorizerConfig, normalize,
};

static WORDS_AND_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w\s]*$").unwrap());

const TITLES: &[&str] = &[
    "Ransom", "RANSOM!!", "Lucid Dreams", "Toxic", "Hey Ya!", "Circles", "Sunflower", "Robbery",
    "Ran$om!", "Mr. Brightside",
];
const ARTISTS: &[&str] =
    &["Lil Tecca", "Juice WRLD", "Britney Spears", "OutKast", "Post Malone", "The Killers"];
const ALBUMS: &[&str] = &[
    "We Love You Tecca",
    "Goodbye & Good Riddance",
    "In The Zone",
    "Hollywood's Bleeding",
    "Hot Fuss",
];

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap()
}

fn arb_track() -> impl Strategy<Value = Track> {
    (
        prop::sample::select(TITLES),
        prop::sample::select(ARTISTS),
        prop::sample::select(ALBUMS),
        60_000u64..400_000,
    )
        .prop_map(|(title, artist, album, duration)| Track::new(title, artist, album, duration))
}

/// Catalogs of 1 to 5 playlists, each consistent with its declared track count.
fn arb_catalog() -> impl Strategy<Value = Catalog> {
    prop::collection::vec(
        (prop::collection::vec(arb_track(), 1..7), 1_400_000_000i64..1_700_000_000),
        1..6,
    )
    .prop_map(|playlists| {
        Catalog::new(
            playlists
                .into_iter()
                .enumerate()
                .map(|(pid, (tracks, modified_at))| {
                    let declared = tracks.len() as u32;
                    let mut playlist =
                        Playlist::new(pid as u64, format!("mix {pid}"), declared, modified_at);
                    playlist.tracks = tracks;
                    playlist
                })
                .collect(),
        )
    })
}

fn arb_documents() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("(alpha|beta|gamma|delta|the|echo|[a-z]{2,5}| ){0,8}", 1..12)
}

fn build(catalog: &Catalog, config: RecommenderConfig) -> Recommender {
    Recommender::builder().config(config).reference_time(now()).build(catalog).unwrap()
}

/// **Property: normalization is idempotent**
/// *For any* text, normalizing twice yields the same string as normalizing
/// once, and the result holds only lowercase word characters and whitespace.
mod prop_normalize {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn idempotent_and_restricted(text in "[ -~àéÉÜßΣñÑ\t]{0,40}") {
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once), once.clone());
            prop_assert!(WORDS_AND_SPACES.is_match(&once));
            prop_assert!(!once.chars().any(char::is_uppercase));
        }
    }
}

/// **Property: similarity is reflexive and symmetric**
/// *For any* corpus, every instance scores exactly 1.0 against itself, every
/// pair scores the same in both directions, and all scores lie in `[0, 1]`.
mod prop_similarity {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn reflexive_symmetric_bounded(docs in arb_documents()) {
            let space = VectorSpace::fit(&docs, &VectorizerConfig::default()).unwrap();
            let index = DenseSimilarityMatrix::build(&space).unwrap();
            for i in 0..index.len() {
                prop_assert_eq!(index.similarity(i, i).unwrap(), 1.0);
                for j in 0..index.len() {
                    let s = index.similarity(i, j).unwrap();
                    prop_assert_eq!(s, index.similarity(j, i).unwrap());
                    prop_assert!((0.0..=1.0).contains(&s));
                }
            }
        }

        #[test]
        fn on_demand_rows_match_dense_rows(docs in arb_documents()) {
            let space = std::sync::Arc::new(
                VectorSpace::fit(&docs, &VectorizerConfig::default()).unwrap(),
            );
            let dense = DenseSimilarityMatrix::build(&space).unwrap();
            let lazy = OnDemandIndex::new(space).unwrap();
            for i in 0..dense.len() {
                prop_assert_eq!(dense.similarity_row(i).unwrap(), lazy.similarity_row(i).unwrap());
            }
        }
    }
}

/// **Property: query results are bounded and unique**
/// *For any* catalog and known title, `recommend` returns
/// `min(top_n, distinct titles)` results in descending score order with no
/// repeated normalized title, led by the query's own title.
mod prop_recommend {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn bounded_unique_ranked(
            catalog in arb_catalog(),
            pick in any::<prop::sample::Index>(),
            top_n in 1usize..12,
        ) {
            let rec = build(&catalog, RecommenderConfig::default());
            let titles: Vec<_> = catalog
                .playlists
                .iter()
                .flat_map(|p| p.tracks.iter().map(|t| t.track_name.clone()))
                .collect();
            let query = pick.get(&titles);
            let distinct: HashSet<_> = titles.iter().map(|t| normalize(t)).collect();

            let set = rec.recommend(query, top_n).unwrap();
            prop_assert!(!set.is_not_found());
            prop_assert_eq!(set.items.len(), top_n.min(distinct.len()));
            prop_assert_eq!(&set.items[0].track_name, &normalize(query));

            let names: HashSet<_> = set.items.iter().map(|r| r.track_name.as_str()).collect();
            prop_assert_eq!(names.len(), set.items.len());
            prop_assert!(set.items.windows(2).all(|w| w[0].score >= w[1].score));
        }

        #[test]
        fn rebuild_is_deterministic(catalog in arb_catalog()) {
            let config = RecommenderConfig::builder()
                .index_strategy(IndexStrategy::OnDemand)
                .build()
                .unwrap();
            let first = build(&catalog, config.clone());
            let second = build(&catalog, config);
            prop_assert_eq!(first.composites(), second.composites());
            prop_assert_eq!(first.vector_space().vocabulary(), second.vector_space().vocabulary());
            prop_assert_eq!(first.vector_space().vectors(), second.vector_space().vectors());
        }

        #[test]
        fn diversity_counts_never_exceed_track_count(catalog in arb_catalog()) {
            let rec = build(&catalog, RecommenderConfig::default());
            for row in rec.signals().rows() {
                prop_assert!(row.unique_artists <= row.num_tracks as usize);
                prop_assert!(row.unique_albums <= row.num_tracks as usize);
                prop_assert!(row.normalized_diversity_score.is_finite());
                prop_assert!(row.normalized_playlist_age.is_finite());
            }
        }
    }
}
