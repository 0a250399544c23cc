//! bytering - Demo & Benchmark
//!
//! Bangun ring buffer di atas region (heap atau file mmap), lalu:
//! - Benchmark latency write/read single-thread
//! - Stress test N producer x M consumer dengan checksum
//!
//! Usage:
//!   cargo run --release -- --producers 4 --consumers 2
//!   cargo run --release -- --file /tmp/ring.dat --capacity 1048576

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use bytering::{MmapRing, RingBuffer, HEADER_SIZE};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Demo configuration
#[derive(Debug, Parser)]
#[command(name = "bytering", version, about = "Byte ring buffer demo & benchmark")]
struct Config {
    /// Kapasitas data ring buffer dalam bytes (tanpa header)
    #[arg(long, env = "BYTERING_CAPACITY", default_value_t = 64 * 1024)]
    capacity: usize,

    /// Jumlah thread producer
    #[arg(long, env = "BYTERING_PRODUCERS", default_value_t = 2)]
    producers: usize,

    /// Jumlah thread consumer
    #[arg(long, env = "BYTERING_CONSUMERS", default_value_t = 2)]
    consumers: usize,

    /// Total bytes yang ditulis tiap producer
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    bytes_per_producer: u64,

    /// Ukuran satu write/read
    #[arg(long, default_value_t = 256)]
    chunk: usize,

    /// Pakai file mmap sebagai region, bukan heap
    #[arg(long, env = "BYTERING_FILE")]
    file: Option<PathBuf>,

    /// Filter log (override RUST_LOG), misal "debug" atau "bytering=trace"
    #[arg(long)]
    log_level: Option<String>,
}

impl Config {
    fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            bail!("capacity must be > 0");
        }
        if self.chunk == 0 || self.chunk > self.capacity {
            bail!(
                "chunk must be in 1..={} (got {})",
                self.capacity,
                self.chunk
            );
        }
        if self.producers == 0 || self.consumers == 0 {
            bail!("need at least one producer and one consumer");
        }
        Ok(())
    }
}

/// Statistik stress test
struct StressStats {
    written: AtomicU64,
    read: AtomicU64,
    written_sum: AtomicU64,
    read_sum: AtomicU64,
    truncated_writes: AtomicU64,
    order_violations: AtomicU64,
}

impl StressStats {
    fn new() -> Self {
        Self {
            written: AtomicU64::new(0),
            read: AtomicU64::new(0),
            written_sum: AtomicU64::new(0),
            read_sum: AtomicU64::new(0),
            truncated_writes: AtomicU64::new(0),
            order_violations: AtomicU64::new(0),
        }
    }

    fn print_report(&self, duration: Duration, check_order: bool) -> bool {
        let written = self.written.load(Ordering::Relaxed);
        let read = self.read.load(Ordering::Relaxed);
        let written_sum = self.written_sum.load(Ordering::Relaxed);
        let read_sum = self.read_sum.load(Ordering::Relaxed);
        let truncated = self.truncated_writes.load(Ordering::Relaxed);
        let violations = self.order_violations.load(Ordering::Relaxed);

        println!("\n📊 STRESS TEST RESULTS");
        println!("======================");
        println!("  Duration:         {:.2}s", duration.as_secs_f64());
        println!("  Bytes written:    {}", written);
        println!("  Bytes read:       {}", read);
        println!("  Truncated writes: {}", truncated);
        println!(
            "  Throughput:       {:.2} MB/sec",
            read as f64 / duration.as_secs_f64() / 1_000_000.0
        );

        let ok = written == read && written_sum == read_sum && violations == 0;
        if check_order {
            println!("  Order violations: {}", violations);
        }
        if ok {
            println!("\n✅ No bytes lost, duplicated or reordered");
        } else {
            println!(
                "\n⚠️  MISMATCH - checksum written={} read={}",
                written_sum, read_sum
            );
        }
        ok
    }
}

fn init_tracing(config: &Config) -> Result<()> {
    let filter = match &config.log_level {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        // Truncated write memang sering terjadi saat stress, jangan banjiri log
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,bytering::core=error")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;
    init_tracing(&config)?;

    println!("🚀 bytering - Byte Ring Buffer Demo");
    println!("===================================\n");

    let ok = match &config.file {
        Some(path) => {
            let rb = MmapRing::open_file(path, config.capacity)
                .with_context(|| format!("failed to open ring file {}", path.display()))?;
            if !rb.is_empty() {
                tracing::info!(pending = rb.len(), "discarding bytes left from previous run");
                rb.clear();
            }
            let ok = run(&rb, &config);
            rb.flush().context("failed to flush ring file")?;
            ok
        }
        None => {
            let rb = RingBuffer::create(vec![0u8; HEADER_SIZE + config.capacity])
                .context("failed to create ring buffer")?;
            run(&rb, &config)
        }
    };

    if !ok {
        bail!("stress test detected lost or corrupted bytes");
    }

    println!("\n✅ All benchmarks complete!");
    Ok(())
}

fn run<B>(rb: &RingBuffer<B>, config: &Config) -> bool
where
    B: AsRef<[u8]> + AsMut<[u8]> + Send,
{
    rb.dbg_print();
    println!();

    benchmark_ring_buffer(rb, config.chunk);
    let ok = stress(rb, config);

    println!();
    rb.dbg_print();
    ok
}

fn benchmark_ring_buffer<B>(rb: &RingBuffer<B>, chunk: usize)
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    println!("📊 Ring Buffer Benchmark (single thread)");
    println!("----------------------------------------");

    const ITERATIONS: usize = 1_000_000;
    let src = vec![0xA5u8; chunk];
    let mut dst = vec![0u8; chunk];

    // Warm up
    for _ in 0..1000 {
        rb.write(&src);
        let _ = rb.read(&mut dst);
    }

    // Benchmark write
    let start = Instant::now();
    for _ in 0..ITERATIONS {
        if rb.free() < chunk {
            rb.clear();
        }
        rb.write(&src);
    }
    let write_duration = start.elapsed();
    rb.clear();

    // Benchmark write+read cycle
    let start = Instant::now();
    for _ in 0..ITERATIONS {
        rb.write(&src);
        let _ = rb.read(&mut dst);
    }
    let cycle_duration = start.elapsed();
    rb.clear();

    let write_ns = write_duration.as_nanos() as f64 / ITERATIONS as f64;
    let cycle_ns = cycle_duration.as_nanos() as f64 / ITERATIONS as f64;

    println!("  Chunk size: {} bytes", chunk);
    println!("  Operations: {}", ITERATIONS);
    println!(
        "  Write latency:      {:.2} ns/op ({:.3} μs/op)",
        write_ns,
        write_ns / 1000.0
    );
    println!(
        "  Write+read latency: {:.2} ns/op ({:.3} μs/op)",
        cycle_ns,
        cycle_ns / 1000.0
    );
    println!(
        "  Throughput:         {:.2} MB/sec\n",
        (ITERATIONS * chunk) as f64 / cycle_duration.as_secs_f64() / 1_000_000.0
    );
}

/// Byte ke-`i` dari stream producer. Pola berulang setiap 251 byte (prima)
/// supaya tidak sejajar dengan ukuran chunk atau kapasitas.
#[inline(always)]
fn pattern(i: u64) -> u8 {
    (i % 251) as u8
}

fn stress<B>(rb: &RingBuffer<B>, config: &Config) -> bool
where
    B: AsRef<[u8]> + AsMut<[u8]> + Send,
{
    println!(
        "🔥 Stress: {} producer(s) x {} consumer(s), {} bytes each, chunk {}",
        config.producers, config.consumers, config.bytes_per_producer, config.chunk
    );

    let stats = StressStats::new();
    let producers_done = AtomicBool::new(false);
    // Urutan byte hanya bisa dicek untuk pasangan 1 producer / 1 consumer
    let check_order = config.producers == 1 && config.consumers == 1;

    let start = Instant::now();

    thread::scope(|s| {
        let (stats, done) = (&stats, &producers_done);

        let producers: Vec<_> = (0..config.producers)
            .map(|_| s.spawn(move || produce(rb, config, stats)))
            .collect();

        for _ in 0..config.consumers {
            s.spawn(move || consume(rb, config.chunk, stats, done, check_order));
        }

        for handle in producers {
            handle.join().ok();
        }
        producers_done.store(true, Ordering::Release);
    });

    stats.print_report(start.elapsed(), check_order)
}

fn produce<B>(rb: &RingBuffer<B>, config: &Config, stats: &StressStats)
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    let mut chunk = vec![0u8; config.chunk];
    let mut offset = 0u64;

    while offset < config.bytes_per_producer {
        let want = (config.bytes_per_producer - offset).min(config.chunk as u64) as usize;
        for (i, b) in chunk[..want].iter_mut().enumerate() {
            *b = pattern(offset + i as u64);
        }

        let n = rb.write(&chunk[..want]);
        if n < want {
            stats.truncated_writes.fetch_add(1, Ordering::Relaxed);
        }
        if n == 0 {
            thread::yield_now();
            continue;
        }

        let sum: u64 = chunk[..n].iter().map(|&b| b as u64).sum();
        stats.written.fetch_add(n as u64, Ordering::Relaxed);
        stats.written_sum.fetch_add(sum, Ordering::Relaxed);
        offset += n as u64;
    }
}

fn consume<B>(
    rb: &RingBuffer<B>,
    chunk: usize,
    stats: &StressStats,
    producers_done: &AtomicBool,
    check_order: bool,
) where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    let mut buf = vec![0u8; chunk];
    let mut expected = 0u64;

    loop {
        // Flag dicek sebelum read: kosong setelah semua producer selesai = habis
        let done = producers_done.load(Ordering::Acquire);

        let n = match rb.read(&mut buf) {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "read failed");
                return;
            }
        };

        if n == 0 {
            if done {
                return;
            }
            thread::yield_now();
            continue;
        }

        if check_order {
            for &b in &buf[..n] {
                if b != pattern(expected) {
                    stats.order_violations.fetch_add(1, Ordering::Relaxed);
                }
                expected += 1;
            }
        }

        let sum: u64 = buf[..n].iter().map(|&b| b as u64).sum();
        stats.read.fetch_add(n as u64, Ordering::Relaxed);
        stats.read_sum.fetch_add(sum, Ordering::Relaxed);
    }
}
