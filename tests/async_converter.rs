use std::cell::Cell;
use std::rc::Rc;

use wallcal::{
    render, AsyncConverter, CalendarConfig, Converter, Error, OutputFormat, RenderedCalendar, Result,
};

/// Not `Send`: only usable because it lives on the worker thread.
struct CountingBackend {
    calls: Rc<Cell<usize>>,
}

impl Converter for CountingBackend {
    fn rasterize(&self, calendar: &RenderedCalendar, format: OutputFormat) -> Result<Vec<u8>> {
        self.calls.set(self.calls.get() + 1);
        Ok(format!("{}:{}:{}", format, calendar.year, self.calls.get()).into_bytes())
    }
}

fn backend() -> Result<CountingBackend> {
    Ok(CountingBackend {
        calls: Rc::new(Cell::new(0)),
    })
}

fn calendar(year: i32) -> RenderedCalendar {
    render(&CalendarConfig::for_year(year))
}

#[tokio::test]
async fn converts_on_worker_thread() {
    let conv = AsyncConverter::new(backend).await.expect("worker");
    let png = conv.convert(calendar(2024), OutputFormat::Png).await.unwrap();
    assert_eq!(png, b"png:2024:1");
    let pdf = conv.convert(calendar(2025), OutputFormat::Pdf).await.unwrap();
    assert_eq!(pdf, b"pdf:2025:2");

    // SVG never reaches the backend
    let cal = calendar(2024);
    let svg = conv.convert(cal.clone(), OutputFormat::Svg).await.unwrap();
    assert_eq!(svg, cal.svg.into_bytes());

    conv.close().await.unwrap();
}

#[tokio::test]
async fn concurrent_requests_are_serialized() {
    let conv = AsyncConverter::new(backend).await.expect("worker");
    let jobs = (0..8).map(|i| {
        let conv = conv.clone();
        async move { conv.convert(calendar(2020 + i), OutputFormat::Png).await }
    });
    let results = futures::future::join_all(jobs).await;
    let mut counters: Vec<usize> = results
        .into_iter()
        .map(|r| {
            let s = String::from_utf8(r.unwrap()).unwrap();
            s.rsplit(':').next().unwrap().parse().unwrap()
        })
        .collect();
    counters.sort_unstable();
    assert_eq!(counters, (1..=8).collect::<Vec<_>>());
}

#[tokio::test]
async fn init_failure_is_reported() {
    let res = AsyncConverter::new(|| -> Result<CountingBackend> {
        Err(Error::InitializationError("no browser".into()))
    })
    .await;
    assert!(matches!(res, Err(Error::InitializationError(m)) if m == "no browser"));
}

#[tokio::test]
async fn closed_worker_rejects_calls() {
    let conv = AsyncConverter::new(backend).await.expect("worker");
    let other = conv.clone();
    conv.close().await.unwrap();
    let res = other.convert(calendar(2024), OutputFormat::Png).await;
    assert!(matches!(res, Err(Error::ConversionError(_))));
}

#[test]
fn blocking_handle_works_from_plain_threads() {
    let conv = AsyncConverter::start(backend).expect("worker");
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let conv = conv.clone();
            std::thread::spawn(move || conv.convert_blocking(calendar(2024), OutputFormat::Png))
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap().unwrap().starts_with(b"png:2024:"));
    }
    // usable through the trait as well
    let pdf = Converter::convert(&conv, &calendar(2024), OutputFormat::Pdf).unwrap();
    assert!(pdf.starts_with(b"pdf:"));
}
