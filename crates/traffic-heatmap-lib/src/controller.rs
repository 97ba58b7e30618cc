//! View controller: the single owner of view state and network activity
//!
//! The controller holds the current coordinates, the search box text, the
//! search-in-flight state and the latest sample list. It is the only component
//! that starts network requests and the only owner of the refresh timer.
//!
//! Requests run as spawned tasks and report back through an in-order channel.
//! Nothing is mutated until the owning thread calls
//! [`ViewController::process_events`], so the state is only ever touched from
//! one place.
//!
//! Ordering rules:
//! - At most one search runs at a time; submissions while searching are rejected.
//! - Every sample fetch gets a sequence number when it is issued. With
//!   [`Config::discard_stale_responses`] set, a response older than the newest
//!   applied one is dropped; otherwise the last response to arrive wins.
//! - A coordinate change rearms the refresh timer but leaves in-flight fetches alone.
//! - A found city moves the view, rearms the timer and numbers its fetch in one
//!   step on the owning thread, so a tick for the old position is always older.
//! - Events produced before the last activation/deactivation are ignored.

use crate::{
    Config, Coordinates, GeocodeCandidate, Geocoder, HeatPoint, HttpTrafficClient,
    NominatimClient, RefreshTask, Result, SampleSummary, TrafficSample, TrafficSource, heat,
    runtime,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Controller wired to the real HTTP services
pub type HttpViewController = ViewController<NominatimClient, HttpTrafficClient>;

type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Search control state
#[derive(Clone, Debug, PartialEq)]
pub enum SearchState {
    Idle,
    Searching { query: String },
}

/// A message for the user, shown until dismissed
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    CityNotFound { query: String },
    SearchFailed { query: String, reason: String },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CityNotFound { query } => write!(f, "City \"{query}\" not found. Try again!"),
            Self::SearchFailed { query, reason } => {
                write!(f, "Searching for \"{query}\" failed: {reason}")
            }
        }
    }
}

/// Why a sample fetch was issued
#[derive(Clone, Copy, Debug, PartialEq)]
enum FetchOrigin {
    Activation,
    Tick,
    Search,
    Manual,
}

enum Event {
    Samples {
        epoch: u64,
        seq: u64,
        at: Coordinates,
        origin: FetchOrigin,
        result: Result<Vec<TrafficSample>>,
    },
    Geocoded {
        epoch: u64,
        query: String,
        result: Result<Option<GeocodeCandidate>>,
    },
}

impl Event {
    fn epoch(&self) -> u64 {
        match self {
            Self::Samples { epoch, .. } | Self::Geocoded { epoch, .. } => *epoch,
        }
    }
}

/// Sending half of the event channel, waking the UI after each event
#[derive(Clone)]
struct EventSink {
    tx: mpsc::UnboundedSender<Event>,
    notify: Notifier,
}

impl EventSink {
    fn send(&self, event: Event) {
        // A closed channel means the controller is gone; the result has nowhere to go.
        if self.tx.send(event).is_ok() {
            (self.notify)();
        }
    }
}

/// Everything a fetch task needs, cheap to clone into tasks and timer callbacks
struct Fetcher<T> {
    traffic: Arc<T>,
    sink: EventSink,
    sequence: Arc<AtomicU64>,
}

impl<T> Clone for Fetcher<T> {
    fn clone(&self) -> Self {
        Self {
            traffic: self.traffic.clone(),
            sink: self.sink.clone(),
            sequence: self.sequence.clone(),
        }
    }
}

impl<T: TrafficSource> Fetcher<T> {
    fn next_seq(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn run(&self, epoch: u64, seq: u64, at: Coordinates, origin: FetchOrigin) {
        tracing::debug!("Fetch #{} ({:?}) started for {}", seq, origin, at);
        let result = self.traffic.samples_near(at).await;
        self.sink.send(Event::Samples {
            epoch,
            seq,
            at,
            origin,
            result,
        });
    }

    /// Number the request immediately and run it on its own task
    fn issue(&self, epoch: u64, at: Coordinates, origin: FetchOrigin) -> u64 {
        let seq = self.next_seq();
        let fetcher = self.clone();
        runtime::spawn(async move {
            fetcher.run(epoch, seq, at, origin).await;
        });
        seq
    }
}

/// Owner of the heatmap view state. See the module documentation.
pub struct ViewController<G, T> {
    config: Config,
    geocoder: Arc<G>,
    fetcher: Fetcher<T>,
    events: mpsc::UnboundedReceiver<Event>,

    coordinates: Coordinates,
    city_text: String,
    search: SearchState,
    /// Sequence number of the fetch the running search is waiting for
    search_fetch: Option<u64>,
    place_name: Option<String>,
    samples: Vec<TrafficSample>,

    notice: Option<Notice>,
    last_diagnostic: Option<String>,
    last_refresh: Option<instant::Instant>,
    pending_recenter: Option<Coordinates>,

    refresh: Option<RefreshTask>,
    active: bool,
    epoch: u64,
    newest_applied_seq: u64,
}

impl HttpViewController {
    /// Build a controller talking to the configured HTTP services
    pub fn from_config(config: Config) -> Result<Self> {
        let geocoder = NominatimClient::new(&config)?;
        let traffic = HttpTrafficClient::new(&config)?;
        Ok(Self::new(config, geocoder, traffic))
    }
}

impl<G: Geocoder, T: TrafficSource> ViewController<G, T> {
    pub fn new(config: Config, geocoder: G, traffic: T) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let fetcher = Fetcher {
            traffic: Arc::new(traffic),
            sink: EventSink {
                tx,
                notify: Arc::new(|| {}),
            },
            sequence: Arc::new(AtomicU64::new(0)),
        };

        Self {
            coordinates: config.default_coordinates,
            city_text: config.default_city.clone(),
            config,
            geocoder: Arc::new(geocoder),
            fetcher,
            events: rx,
            search: SearchState::Idle,
            search_fetch: None,
            place_name: None,
            samples: Vec::new(),
            notice: None,
            last_diagnostic: None,
            last_refresh: None,
            pending_recenter: None,
            refresh: None,
            active: false,
            epoch: 0,
            newest_applied_seq: 0,
        }
    }

    /// Called from background tasks whenever an event is queued, e.g. to request a repaint.
    ///
    /// Set this before [`activate`](Self::activate): tasks already running keep the old one.
    pub fn with_notifier(mut self, notify: impl Fn() + Send + Sync + 'static) -> Self {
        self.fetcher.sink.notify = Arc::new(notify);
        self
    }

    /// Start the view: fetch once for the current coordinates and arm the refresh timer.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        if !runtime::in_runtime_context() {
            tracing::error!("Cannot activate the view outside of a tokio runtime");
            return;
        }

        self.active = true;
        self.epoch += 1;
        tracing::info!(
            "View activated at {} (refresh every {:?})",
            self.coordinates,
            self.config.refresh_interval()
        );

        self.fetcher
            .issue(self.epoch, self.coordinates, FetchOrigin::Activation);
        self.arm_refresh();
    }

    /// Stop the view: tear down the timer and ignore every response still in flight.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.epoch += 1;
        self.refresh = None;
        self.search = SearchState::Idle;
        self.search_fetch = None;
        tracing::info!("View deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Fetch samples for `at`, or for the current coordinates when `None`.
    ///
    /// The result replaces the sample list when it is applied. Returns the
    /// request's sequence number, or `None` if no runtime is available.
    pub fn fetch_samples(&mut self, at: Option<Coordinates>) -> Option<u64> {
        if !runtime::in_runtime_context() {
            tracing::error!("Cannot fetch samples outside of a tokio runtime");
            return None;
        }
        let at = at.unwrap_or(self.coordinates);
        Some(self.fetcher.issue(self.epoch, at, FetchOrigin::Manual))
    }

    /// Search for `text` and move the view there.
    ///
    /// Returns `false` without doing anything when a search is already in
    /// flight, when `text` is blank, or when no runtime is available.
    pub fn search_city(&mut self, text: &str) -> bool {
        if let SearchState::Searching { query } = &self.search {
            tracing::debug!("Search for '{}' ignored: '{}' still in flight", text, query);
            return false;
        }
        let query = text.trim().to_string();
        if query.is_empty() {
            return false;
        }
        if !runtime::in_runtime_context() {
            tracing::error!("Cannot search outside of a tokio runtime");
            return false;
        }

        tracing::info!("Searching for city '{}'", query);
        self.search = SearchState::Searching {
            query: query.clone(),
        };
        self.notice = None;

        // Only the lookup runs in the background. Moving the view, rearming the
        // timer and numbering the follow-up fetch happen together in `apply_geocoded`.
        let epoch = self.epoch;
        let geocoder = self.geocoder.clone();
        let sink = self.fetcher.sink.clone();
        runtime::spawn(async move {
            let result = geocoder
                .search(&query)
                .await
                .map(|candidates| candidates.into_iter().next());
            sink.send(Event::Geocoded {
                epoch,
                query,
                result,
            });
        });
        true
    }

    /// Search for the current search box text
    pub fn submit_search(&mut self) -> bool {
        let text = self.city_text.clone();
        self.search_city(&text)
    }

    /// Apply every queued result. Returns whether any visible state changed.
    pub fn process_events(&mut self) -> bool {
        profiling::scope!("ViewController::process_events");

        let mut changed = false;
        while let Ok(event) = self.events.try_recv() {
            changed |= self.apply(event);
        }
        changed
    }

    fn apply(&mut self, event: Event) -> bool {
        if event.epoch() != self.epoch {
            tracing::trace!("Ignoring event from a previous activation");
            return false;
        }

        match event {
            Event::Samples {
                seq,
                at,
                origin,
                result,
                ..
            } => self.apply_samples(seq, at, origin, result),
            Event::Geocoded { query, result, .. } => {
                self.apply_geocoded(query, result);
                true
            }
        }
    }

    fn apply_samples(
        &mut self,
        seq: u64,
        at: Coordinates,
        origin: FetchOrigin,
        result: Result<Vec<TrafficSample>>,
    ) -> bool {
        // The search is over once its own fetch answers, even if that answer turns out stale
        let finished_search = self.search_fetch == Some(seq);
        if finished_search {
            self.search_fetch = None;
            self.search = SearchState::Idle;
        }

        if self.config.discard_stale_responses && seq < self.newest_applied_seq {
            tracing::warn!(
                "Discarding stale response #{} ({:?}) for {}: #{} already applied",
                seq,
                origin,
                at,
                self.newest_applied_seq
            );
            return finished_search;
        }
        self.newest_applied_seq = self.newest_applied_seq.max(seq);

        match result {
            Ok(samples) => {
                tracing::debug!(
                    "Fetch #{} ({:?}) returned {} samples for {}",
                    seq,
                    origin,
                    samples.len(),
                    at
                );
                self.samples = samples;
                self.last_refresh = Some(instant::Instant::now());
                self.last_diagnostic = None;
            }
            Err(e) => {
                if e.is_transport() {
                    tracing::error!("Error fetching traffic data for {}: {}", at, e);
                } else {
                    tracing::warn!("Unexpected backend response for {}: {}", at, e);
                }
                self.samples.clear();
                self.last_diagnostic = Some(e.to_string());
            }
        }
        true
    }

    fn apply_geocoded(&mut self, query: String, result: Result<Option<GeocodeCandidate>>) {
        let found = result.and_then(|candidate| {
            candidate
                .map(|c| c.coordinates().map(|at| (at, c.display_name)))
                .transpose()
        });

        match found {
            Ok(Some((at, name))) => {
                tracing::info!(
                    "Found city '{}' at {} ({})",
                    query,
                    at,
                    name.as_deref().unwrap_or("no display name")
                );
                self.coordinates = at;
                self.place_name = name;
                self.pending_recenter = Some(at);
                self.arm_refresh();

                if runtime::in_runtime_context() {
                    let seq = self.fetcher.issue(self.epoch, at, FetchOrigin::Search);
                    self.search_fetch = Some(seq);
                } else {
                    tracing::error!("Cannot fetch samples outside of a tokio runtime");
                    self.search = SearchState::Idle;
                }
            }
            Ok(None) => {
                tracing::info!("City '{}' not found", query);
                self.notice = Some(Notice::CityNotFound { query });
                self.search = SearchState::Idle;
            }
            Err(e) => {
                tracing::error!("Error searching city '{}': {}", query, e);
                self.last_diagnostic = Some(e.to_string());
                self.notice = Some(Notice::SearchFailed {
                    query,
                    reason: e.to_string(),
                });
                self.search = SearchState::Idle;
            }
        }
    }

    /// (Re)start the refresh timer for the current coordinates; replaces any previous timer.
    fn arm_refresh(&mut self) {
        if !self.active {
            return;
        }
        let period = self.config.refresh_interval();
        let epoch = self.epoch;
        let at = self.coordinates;
        let fetcher = self.fetcher.clone();
        self.refresh = Some(RefreshTask::spawn(period, period, move || {
            fetcher.issue(epoch, at, FetchOrigin::Tick);
        }));
    }

    // === Read access for the UI ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Provider's name for the place the last successful search moved to
    pub fn place_name(&self) -> Option<&str> {
        self.place_name.as_deref()
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn city_text(&self) -> &str {
        &self.city_text
    }

    /// Search box binding
    pub fn city_text_mut(&mut self) -> &mut String {
        &mut self.city_text
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.search, SearchState::Searching { .. })
    }

    pub fn samples(&self) -> &[TrafficSample] {
        &self.samples
    }

    /// True exactly when the "no data" notice should be shown
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn heat_points(&self) -> Vec<HeatPoint> {
        heat::heat_points(&self.samples)
    }

    pub fn summary(&self) -> SampleSummary {
        SampleSummary::from_samples(&self.samples)
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn last_diagnostic(&self) -> Option<&str> {
        self.last_diagnostic.as_deref()
    }

    /// Time since the last successfully applied fetch
    pub fn since_last_refresh(&self) -> Option<Duration> {
        self.last_refresh.map(|t| t.elapsed())
    }

    /// Coordinates the map should move to, once
    pub fn take_recenter(&mut self) -> Option<Coordinates> {
        self.pending_recenter.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    /// Geocoder answering every query with the same script
    struct MockGeocoder {
        delay: Duration,
        answer: fn() -> Result<Vec<GeocodeCandidate>>,
        calls: Arc<AtomicUsize>,
    }

    impl MockGeocoder {
        fn new(answer: fn() -> Result<Vec<GeocodeCandidate>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let geocoder = Self {
                delay: Duration::from_millis(50),
                answer,
                calls: calls.clone(),
            };
            (geocoder, calls)
        }
    }

    impl Geocoder for MockGeocoder {
        async fn search(&self, _query: &str) -> Result<Vec<GeocodeCandidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            sleep(self.delay).await;
            (self.answer)()
        }
    }

    type Scripted = (Duration, Result<Vec<TrafficSample>>);

    /// Traffic source replaying scripted responses, then `fallback` forever
    struct MockTraffic {
        script: Mutex<VecDeque<Scripted>>,
        fallback: Vec<TrafficSample>,
        calls: Arc<Mutex<Vec<Coordinates>>>,
    }

    impl MockTraffic {
        fn new(script: Vec<Scripted>, fallback: Vec<TrafficSample>) -> (Self, Arc<Mutex<Vec<Coordinates>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let traffic = Self {
                script: Mutex::new(script.into()),
                fallback,
                calls: calls.clone(),
            };
            (traffic, calls)
        }

        fn constant(samples: Vec<TrafficSample>) -> (Self, Arc<Mutex<Vec<Coordinates>>>) {
            Self::new(Vec::new(), samples)
        }
    }

    impl TrafficSource for MockTraffic {
        async fn samples_near(&self, at: Coordinates) -> Result<Vec<TrafficSample>> {
            self.calls.lock().unwrap().push(at);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some((delay, result)) => {
                    sleep(delay).await;
                    result
                }
                None => Ok(self.fallback.clone()),
            }
        }
    }

    fn bangalore_samples() -> Vec<TrafficSample> {
        vec![TrafficSample::new(12.97, 77.59, Some(80.0))]
    }

    fn mumbai() -> Result<Vec<GeocodeCandidate>> {
        Ok(vec![
            GeocodeCandidate::new("19.0760", "72.8777"),
            GeocodeCandidate::new("18.9388", "72.8354"),
        ])
    }

    fn nowhere() -> Result<Vec<GeocodeCandidate>> {
        Ok(Vec::new())
    }

    fn geocoder_down() -> Result<Vec<GeocodeCandidate>> {
        Err(Error::Status {
            url: "https://nominatim.openstreetmap.org/search".to_string(),
            status: 503,
        })
    }

    fn controller(
        config: Config,
        geocode: fn() -> Result<Vec<GeocodeCandidate>>,
        traffic: MockTraffic,
    ) -> (ViewController<MockGeocoder, MockTraffic>, Arc<AtomicUsize>) {
        let (geocoder, geocode_calls) = MockGeocoder::new(geocode);
        (ViewController::new(config, geocoder, traffic), geocode_calls)
    }

    async fn settle() {
        sleep(Duration::from_millis(500)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_renders_samples() {
        let (traffic, calls) = MockTraffic::constant(bangalore_samples());
        let (mut view, _) = controller(Config::default(), mumbai, traffic);

        view.activate();
        settle().await;
        assert!(view.process_events());

        assert_eq!(*calls.lock().unwrap(), vec![Coordinates::BANGALORE]);
        let points = view.heat_points();
        assert_eq!(points.len(), 1);
        assert!((points[0].intensity - 0.8).abs() < 1e-12);
        assert!(!view.is_empty());
        assert!(view.since_last_refresh().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_backend_shows_no_data() {
        let (traffic, _) = MockTraffic::constant(Vec::new());
        let (mut view, _) = controller(Config::default(), mumbai, traffic);

        view.activate();
        settle().await;
        view.process_events();

        assert!(view.is_empty());
        assert!(view.heat_points().is_empty());
        assert_eq!(view.last_diagnostic(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_protocol_violation_clears_samples() {
        let (traffic, _) = MockTraffic::new(
            vec![
                (Duration::ZERO, Ok(bangalore_samples())),
                (
                    Duration::ZERO,
                    crate::parse_samples(br#"{"error": "boom"}"#),
                ),
            ],
            Vec::new(),
        );
        let (mut view, _) = controller(Config::default(), mumbai, traffic);

        view.activate();
        settle().await;
        view.process_events();
        assert_eq!(view.samples().len(), 1);

        view.fetch_samples(None);
        settle().await;
        view.process_events();

        assert!(view.is_empty());
        assert!(
            view.last_diagnostic()
                .is_some_and(|d| d.contains("expected a JSON array"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_clears_samples() {
        let (traffic, _) = MockTraffic::new(
            vec![
                (Duration::ZERO, Ok(bangalore_samples())),
                (
                    Duration::ZERO,
                    Err(Error::Status {
                        url: "http://127.0.0.1:5000/traffic".to_string(),
                        status: 500,
                    }),
                ),
            ],
            Vec::new(),
        );
        let (mut view, _) = controller(Config::default(), mumbai, traffic);

        view.activate();
        settle().await;
        view.process_events();
        view.fetch_samples(None);
        settle().await;
        view.process_events();

        assert!(view.is_empty());
        assert!(view.last_diagnostic().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_fetch_overwrites() {
        let (traffic, _) = MockTraffic::constant(bangalore_samples());
        let (mut view, _) = controller(Config::default(), mumbai, traffic);

        view.fetch_samples(None);
        settle().await;
        view.process_events();
        let first = view.samples().to_vec();

        view.fetch_samples(None);
        settle().await;
        view.process_events();

        assert_eq!(view.samples(), first.as_slice());
        assert_eq!(view.samples().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_for_explicit_coordinates() {
        let (traffic, calls) = MockTraffic::constant(Vec::new());
        let (mut view, _) = controller(Config::default(), mumbai, traffic);
        let delhi = Coordinates::new(28.6139, 77.209).unwrap();

        view.fetch_samples(Some(delhi));
        settle().await;

        assert_eq!(*calls.lock().unwrap(), vec![delhi]);
        assert_eq!(view.coordinates(), Coordinates::BANGALORE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_moves_view() {
        let (traffic, calls) = MockTraffic::constant(bangalore_samples());
        let (mut view, geocode_calls) = controller(Config::default(), mumbai, traffic);

        view.activate();
        settle().await;
        view.process_events();
        assert_eq!(view.take_recenter(), None);

        assert!(view.search_city("Mumbai"));
        assert!(view.is_searching());
        settle().await;
        view.process_events();
        settle().await;
        view.process_events();

        let expected = Coordinates::new(19.076, 72.8777).unwrap();
        assert_eq!(view.coordinates(), expected);
        assert_eq!(view.take_recenter(), Some(expected));
        assert_eq!(view.take_recenter(), None);
        assert_eq!(calls.lock().unwrap().last(), Some(&expected));
        assert_eq!(geocode_calls.load(Ordering::SeqCst), 1);
        assert!(!view.is_searching());
        assert_eq!(view.notice(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_not_found() {
        let (traffic, calls) = MockTraffic::constant(bangalore_samples());
        let (mut view, _) = controller(Config::default(), nowhere, traffic);

        assert!(view.search_city("Zzzznotacity"));
        settle().await;
        view.process_events();

        assert_eq!(view.coordinates(), Coordinates::BANGALORE);
        assert!(calls.lock().unwrap().is_empty());
        assert!(!view.is_searching());
        assert_eq!(
            view.notice(),
            Some(&Notice::CityNotFound {
                query: "Zzzznotacity".to_string()
            })
        );
        assert_eq!(view.take_recenter(), None);

        view.dismiss_notice();
        assert_eq!(view.notice(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_transport_failure() {
        let (traffic, calls) = MockTraffic::constant(bangalore_samples());
        let (mut view, _) = controller(Config::default(), geocoder_down, traffic);

        assert!(view.search_city("Pune"));
        settle().await;
        view.process_events();

        assert_eq!(view.coordinates(), Coordinates::BANGALORE);
        assert!(calls.lock().unwrap().is_empty());
        assert!(!view.is_searching());
        assert!(matches!(view.notice(), Some(Notice::SearchFailed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_rejected_while_in_flight() {
        let (traffic, _) = MockTraffic::constant(Vec::new());
        let (mut view, geocode_calls) = controller(Config::default(), mumbai, traffic);

        assert!(view.search_city("Mumbai"));
        sleep(Duration::from_millis(10)).await;
        view.process_events();
        assert!(view.is_searching());

        assert!(!view.search_city("Delhi"));
        assert_eq!(
            view.search_state(),
            &SearchState::Searching {
                query: "Mumbai".to_string()
            }
        );

        settle().await;
        view.process_events();
        settle().await;
        view.process_events();
        assert_eq!(geocode_calls.load(Ordering::SeqCst), 1);
        assert!(!view.is_searching());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flag_held_until_search_fetch_completes() {
        let (traffic, _) = MockTraffic::new(
            vec![(Duration::from_secs(2), Ok(bangalore_samples()))],
            Vec::new(),
        );
        let (mut view, _) = controller(Config::default(), mumbai, traffic);

        view.search_city("Mumbai");
        sleep(Duration::from_millis(500)).await;
        view.process_events();
        // Geocoded and moved, but the fetch is still pending
        assert_ne!(view.coordinates(), Coordinates::BANGALORE);
        assert!(view.is_searching());

        sleep(Duration::from_millis(2_500)).await;
        view.process_events();
        assert!(!view.is_searching());
        assert_eq!(view.samples().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_search_ignored() {
        let (traffic, _) = MockTraffic::constant(Vec::new());
        let (mut view, geocode_calls) = controller(Config::default(), mumbai, traffic);

        assert!(!view.search_city("   "));
        assert!(!view.is_searching());
        settle().await;
        assert_eq!(geocode_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_uses_search_text() {
        let (traffic, _) = MockTraffic::constant(Vec::new());
        let (mut view, _) = controller(Config::default(), mumbai, traffic);
        assert_eq!(view.city_text(), view.config().default_city);

        *view.city_text_mut() = "Mumbai".to_string();
        assert!(view.submit_search());
        assert_eq!(
            view.search_state(),
            &SearchState::Searching {
                query: "Mumbai".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_refresh_uses_current_coordinates() {
        let (traffic, calls) = MockTraffic::constant(bangalore_samples());
        let (mut view, _) = controller(Config::default(), mumbai, traffic);

        view.activate();
        sleep(Duration::from_millis(25_500)).await;
        view.process_events();
        // Activation fetch plus ticks at 10s and 20s
        assert_eq!(calls.lock().unwrap().len(), 3);

        view.search_city("Mumbai");
        settle().await;
        view.process_events();
        settle().await;
        view.process_events();
        let mumbai = view.coordinates();

        calls.lock().unwrap().clear();
        sleep(Duration::from_millis(10_500)).await;
        view.process_events();
        // The timer was rearmed on the coordinate change, so the next tick targets Mumbai
        assert_eq!(*calls.lock().unwrap(), vec![mumbai]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_coordinate_change_rearms_timer() {
        let (traffic, calls) = MockTraffic::constant(Vec::new());
        let (mut view, _) = controller(Config::default(), mumbai, traffic);

        view.activate();
        sleep(Duration::from_secs(6)).await;
        view.search_city("Mumbai");
        sleep(Duration::from_secs(1)).await;
        view.process_events();
        // Let the search's own fetch reach the backend
        sleep(Duration::from_millis(100)).await;
        calls.lock().unwrap().clear();

        // The old timer would have fired at t=10s; the rearmed one fires ~10s after the move
        sleep(Duration::from_secs(5)).await;
        assert!(calls.lock().unwrap().is_empty());
        sleep(Duration::from_millis(5_500)).await;
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivation_stops_timer_and_ignores_late_responses() {
        let (traffic, calls) = MockTraffic::new(
            vec![(Duration::from_secs(1), Ok(bangalore_samples()))],
            bangalore_samples(),
        );
        let (mut view, _) = controller(Config::default(), mumbai, traffic);

        view.activate();
        sleep(Duration::from_millis(100)).await;
        view.deactivate();
        assert!(!view.is_active());

        sleep(Duration::from_secs(30)).await;
        assert!(!view.process_events());
        assert!(view.is_empty());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifier_called_per_event() {
        let (traffic, _) = MockTraffic::constant(bangalore_samples());
        let (geocoder, _) = MockGeocoder::new(mumbai);
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        let mut view = ViewController::new(Config::default(), geocoder, traffic)
            .with_notifier(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        view.activate();
        settle().await;
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }

    /// Answers with one sample at the queried position; slow for anywhere but Bangalore
    struct EchoTraffic;

    impl TrafficSource for EchoTraffic {
        async fn samples_near(&self, at: Coordinates) -> Result<Vec<TrafficSample>> {
            let delay = if at == Coordinates::BANGALORE {
                Duration::from_millis(10)
            } else {
                Duration::from_millis(300)
            };
            sleep(delay).await;
            Ok(vec![TrafficSample::new(at.lat(), at.lon(), Some(50.0))])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_for_old_position_does_not_outrank_search() {
        let (geocoder, _) = MockGeocoder::new(mumbai);
        let mut view = ViewController::new(Config::default(), geocoder, EchoTraffic);

        view.activate();
        sleep(Duration::from_millis(9_900)).await;
        // Geocoding resolves at 9.95s; the old timer still fires for Bangalore at 10s
        assert!(view.search_city("Mumbai"));
        sleep(Duration::from_millis(600)).await;
        view.process_events();
        assert_eq!(view.coordinates(), Coordinates::new(19.076, 72.8777).unwrap());
        assert!(view.is_searching());

        sleep(Duration::from_millis(500)).await;
        view.process_events();
        assert!(!view.is_searching());
        assert_eq!(view.samples().len(), 1);
        assert!((view.samples()[0].lat - 19.076).abs() < 1e-9);

        // The rearmed timer keeps targeting Mumbai
        sleep(Duration::from_secs(10)).await;
        view.process_events();
        assert!((view.samples()[0].lat - 19.076).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_ends_when_its_fetch_is_outrun() {
        let (traffic, _) = MockTraffic::new(
            vec![
                (
                    Duration::from_secs(2),
                    Ok(vec![TrafficSample::new(19.07, 72.87, Some(50.0))]),
                ),
                (
                    Duration::ZERO,
                    Ok(vec![TrafficSample::new(19.07, 72.87, Some(10.0))]),
                ),
            ],
            Vec::new(),
        );
        let (mut view, _) = controller(Config::default(), mumbai, traffic);

        view.search_city("Mumbai");
        settle().await;
        view.process_events();
        assert!(view.is_searching());

        // A newer manual fetch answers first; the search's answer is then stale
        sleep(Duration::from_millis(10)).await;
        view.fetch_samples(None);
        sleep(Duration::from_secs(3)).await;
        assert!(view.process_events());

        assert!(!view.is_searching());
        assert_eq!(view.samples()[0].congestion_percent, Some(10.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_records_place_name() {
        fn named() -> Result<Vec<GeocodeCandidate>> {
            let mut candidate = GeocodeCandidate::new("19.0760", "72.8777");
            candidate.display_name = Some("Mumbai, Maharashtra, India".to_string());
            Ok(vec![candidate])
        }

        let (traffic, _) = MockTraffic::constant(Vec::new());
        let (mut view, _) = controller(Config::default(), named, traffic);
        assert_eq!(view.place_name(), None);

        view.search_city("Mumbai");
        settle().await;
        view.process_events();
        assert_eq!(view.place_name(), Some("Mumbai, Maharashtra, India"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_candidate_fails_search() {
        fn garbage() -> Result<Vec<GeocodeCandidate>> {
            Ok(vec![GeocodeCandidate::new("north", "72.8777")])
        }

        let (traffic, calls) = MockTraffic::constant(Vec::new());
        let (mut view, _) = controller(Config::default(), garbage, traffic);

        view.search_city("Mumbai");
        settle().await;
        view.process_events();

        assert!(!view.is_searching());
        assert_eq!(view.coordinates(), Coordinates::BANGALORE);
        assert!(calls.lock().unwrap().is_empty());
        assert!(matches!(view.notice(), Some(Notice::SearchFailed { .. })));
    }

    /// A user-triggered fetch at 9.8s resolves at 10.2s; the tick fetch issued at
    /// 10.0s resolves at 10.1s.
    fn overlapping_fetches() -> MockTraffic {
        let samples = |percent: f64| -> Result<Vec<TrafficSample>> {
            Ok(vec![TrafficSample::new(12.97, 77.59, Some(percent))])
        };
        MockTraffic::new(
            vec![
                (Duration::ZERO, samples(10.0)),
                (Duration::from_millis(400), samples(20.0)),
                (Duration::from_millis(100), samples(30.0)),
            ],
            Vec::new(),
        )
        .0
    }

    async fn run_overlap(view: &mut ViewController<MockGeocoder, MockTraffic>) {
        view.activate();
        sleep(Duration::from_millis(9_800)).await;
        view.fetch_samples(None);
        sleep(Duration::from_millis(500)).await;
        view.process_events();
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_fetches_last_arrival_wins_without_guard() {
        let config = Config {
            discard_stale_responses: false,
            ..Default::default()
        };
        let (mut view, _) = controller(config, mumbai, overlapping_fetches());
        run_overlap(&mut view).await;

        assert_eq!(view.samples()[0].congestion_percent, Some(20.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_fetches_newest_request_wins_with_guard() {
        let (mut view, _) = controller(Config::default(), mumbai, overlapping_fetches());
        run_overlap(&mut view).await;

        assert_eq!(view.samples()[0].congestion_percent, Some(30.0));
    }
}
