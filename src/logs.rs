use std::{
    fs::{self, File},
    io,
    path::Path,
    sync::{mpsc, LazyLock, Mutex},
    thread,
};

use anyhow::Result;
use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    {ContentLimit, FileRotate},
};
use log::Log;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

pub type LogSink = Box<dyn Fn(String) + Send>;

/// Where the host app wants log lines, e.g. a debug console.
static HOST_SINK: LazyLock<Mutex<Option<LogSink>>> = LazyLock::new(|| Mutex::new(None));

static LOG_SENDER: LazyLock<Mutex<Option<mpsc::Sender<String>>>> =
    LazyLock::new(|| Mutex::new(None));

pub struct MainLogger {
    write_logger: Box<WriteLogger<FileRotate<AppendTimestamp>>>,
}

impl MainLogger {
    fn new(write_logger: Box<WriteLogger<FileRotate<AppendTimestamp>>>) -> Self {
        Self { write_logger }
    }
}

impl Log for MainLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.write_logger.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.write_logger.log(record);

        // the host sink may be slow, so it only ever sees the channel
        let message = format!(
            "{}:{} -- {}",
            record.level(),
            record.target(),
            record.args()
        );
        if let Ok(sender) = LOG_SENDER.lock() {
            if let Some(tx) = sender.as_ref() {
                let _ = tx.send(message);
            }
        }
    }

    fn flush(&self) {
        self.write_logger.flush();
    }
}

pub fn init(cache_dir: &str) -> Result<()> {
    let path = Path::new(cache_dir).join("logs/main.log");
    let log = FileRotate::new(
        path,
        AppendTimestamp::default(FileLimit::MaxFiles(3)),
        ContentLimit::Lines(1000),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let write_logger = WriteLogger::new(LevelFilter::Info, config, log);
    let main_logger = MainLogger::new(write_logger);
    log::set_boxed_logger(Box::new(main_logger))?;
    log::set_max_level(LevelFilter::Info);

    init_dispatcher();
    Ok(())
}

// One thread drains the channel into the host sink.
fn init_dispatcher() {
    let Ok(mut guard) = LOG_SENDER.lock() else {
        return;
    };
    if guard.is_some() {
        return;
    }

    let (tx, rx) = mpsc::channel::<String>();
    *guard = Some(tx);

    let spawned = thread::Builder::new()
        .name("log-dispatcher".to_string())
        .spawn(move || {
            while let Ok(msg) = rx.recv() {
                if let Ok(sink) = HOST_SINK.lock() {
                    if let Some(sink) = sink.as_ref() {
                        sink(msg);
                    }
                }
            }
        });
    if spawned.is_err() {
        *guard = None;
    }
}

pub fn set_log_sink(sink: LogSink) {
    if let Ok(mut guard) = HOST_SINK.lock() {
        *guard = Some(sink);
    }
}

/// Zips everything under `<cache_dir>/logs/` into `target_file_path`.
pub fn export(cache_dir: &str, target_file_path: &str) -> Result<()> {
    let mut zip = zip::ZipWriter::new(File::create(target_file_path)?);
    let default_options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let log_folder = Path::new(cache_dir).join("logs/");
    for entry in (fs::read_dir(&log_folder)?).flatten() {
        let path = entry.path();
        if path.is_file() {
            if let Some(name) = path.strip_prefix(cache_dir)?.to_str() {
                zip.start_file(name, default_options)?;
                let mut log_file = File::open(&path)?;
                io::copy(&mut log_file, &mut zip)?;
            }
        }
    }

    zip.finish()?;
    Ok(())
}
