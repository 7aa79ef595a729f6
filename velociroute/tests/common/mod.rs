#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use velociroute::condition::mapper::LabelMapper;
use velociroute::error::ClassifyError;
use velociroute::fetch::ImageFetcher;
use velociroute::route::aggregator::RouteAggregator;
use velociroute::route::classifier::PointClassifier;
use velociroute::route::RoutePoint;
use velociroute_inference::{ImageClassifier, LabelDistribution};

pub const VOCABULARY: [&str; 5] = ["highway", "dirt_track", "construction_site", "puddle", "tabby"];

/// Image "contents" understood by [`FakeClassifier`].
pub const ASPHALT: &str = "asphalt";
pub const GRAVEL: &str = "gravel";
pub const BROKEN: &str = "broken";
pub const WET: &str = "wet";
pub const CAT: &str = "cat";
pub const CORRUPT: &str = "corrupt";
pub const EXPLODE: &str = "explode";

enum Served {
    Body(Bytes),
    Error(String),
}

/// Serves canned bodies per url, optionally after a delay.
#[derive(Default, Clone)]
pub struct FakeFetcher {
    responses: Arc<HashMap<String, (Served, Duration)>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl FakeFetcher {
    pub fn builder() -> FakeFetcherBuilder {
        FakeFetcherBuilder::default()
    }

    /// Highest number of fetches that were running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeFetcherBuilder {
    responses: HashMap<String, (Served, Duration)>,
}

impl FakeFetcherBuilder {
    pub fn image(self, url: &str, contents: &str) -> Self {
        self.delayed_image(url, contents, Duration::ZERO)
    }

    pub fn delayed_image(mut self, url: &str, contents: &str, delay: Duration) -> Self {
        self.responses.insert(
            url.to_string(),
            (Served::Body(Bytes::from(contents.to_string())), delay),
        );
        self
    }

    pub fn unreachable(mut self, url: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            (Served::Error(format!("{} returned HTTP 404 Not Found", url)), Duration::ZERO),
        );
        self
    }

    pub fn build(self) -> FakeFetcher {
        FakeFetcher {
            responses: Arc::new(self.responses),
            ..FakeFetcher::default()
        }
    }
}

impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, location: &str) -> Result<Bytes, ClassifyError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);

        let result = match self.responses.get(location) {
            Some((served, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                match served {
                    Served::Body(body) => Ok(body.clone()),
                    Served::Error(message) => Err(ClassifyError::Transport(message.clone())),
                }
            }
            None => Err(ClassifyError::Transport(format!("connection failed: {}", location))),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Treats the image bytes as a key into a table of scripted model outputs.
pub struct FakeClassifier {
    vocabulary: Vec<String>,
    scripts: HashMap<&'static str, [f32; 5]>,
    infer_delay: Duration,
    inferences_started: AtomicUsize,
}

impl FakeClassifier {
    /// Every `infer` call blocks its thread for `delay`.
    pub fn with_infer_delay(delay: Duration) -> Self {
        Self {
            infer_delay: delay,
            ..Self::default()
        }
    }

    pub fn inferences_started(&self) -> usize {
        self.inferences_started.load(Ordering::SeqCst)
    }
}

impl Default for FakeClassifier {
    fn default() -> Self {
        let scripts = HashMap::from([
            (ASPHALT, [0.8, 0.05, 0.05, 0.05, 0.05]),
            (GRAVEL, [0.1, 0.7, 0.1, 0.05, 0.05]),
            (BROKEN, [0.1, 0.1, 0.7, 0.05, 0.05]),
            (WET, [0.05, 0.05, 0.1, 0.75, 0.05]),
            (CAT, [0.0, 0.0, 0.0, 0.0, 1.0]),
            (EXPLODE, [0.0; 5]),
        ]);

        Self {
            vocabulary: VOCABULARY.iter().map(|label| label.to_string()).collect(),
            scripts,
            infer_delay: Duration::ZERO,
            inferences_started: AtomicUsize::new(0),
        }
    }
}

impl ImageClassifier for FakeClassifier {
    type Input = String;

    fn preprocess(&self, buffer: &[u8]) -> Result<Self::Input> {
        let contents = std::str::from_utf8(buffer)?;
        if contents == CORRUPT || !self.scripts.contains_key(contents) {
            bail!("unrecognized image format");
        }
        Ok(contents.to_string())
    }

    fn infer(&self, input: Self::Input) -> Result<LabelDistribution> {
        self.inferences_started.fetch_add(1, Ordering::SeqCst);
        if !self.infer_delay.is_zero() {
            std::thread::sleep(self.infer_delay);
        }
        if input == EXPLODE {
            bail!("model output had unexpected shape");
        }
        let scores = self
            .scripts
            .get(input.as_str())
            .ok_or_else(|| anyhow!("no script for {}", input))?;

        Ok(LabelDistribution::from_pairs(
            self.vocabulary.iter().cloned().zip(scores.iter().copied()),
        ))
    }

    fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }
}

pub fn aggregator(fetcher: FakeFetcher) -> RouteAggregator<FakeFetcher, FakeClassifier> {
    aggregator_with(fetcher, Arc::new(FakeClassifier::default()))
}

pub fn aggregator_with(
    fetcher: FakeFetcher,
    classifier: Arc<FakeClassifier>,
) -> RouteAggregator<FakeFetcher, FakeClassifier> {
    RouteAggregator::new(PointClassifier::new(
        fetcher,
        classifier,
        LabelMapper::default(),
    ))
}

pub fn url(index: usize) -> String {
    format!("http://images.test/{}.jpg", index)
}

pub fn points(count: usize) -> Vec<RoutePoint> {
    (0..count)
        .map(|index| RoutePoint::new(url(index), index as f64 * 0.5))
        .collect()
}
