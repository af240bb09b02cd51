use std::sync::{Arc, Mutex};

use image::GrayImage;
use tracing::{info, Instrument};

use super::normalize::normalize_items;
use super::preprocess::Photo;
use super::types::{ProgressFn, RecognitionRequest, TextRecognizer, TextRegion};
use super::vocabulary::recognition_vocabulary;
use super::ExtractionError;

// ──────────────────────────────────────────────
// LocalOcrStrategy
// ──────────────────────────────────────────────

/// On-device extraction: one recognition pass, top candidate per region,
/// normalized and filtered into list items.
pub struct LocalOcrStrategy {
    recognizer: Arc<dyn TextRecognizer + Send + Sync>,
    custom_words: Vec<String>,
}

impl LocalOcrStrategy {
    pub fn new(recognizer: Arc<dyn TextRecognizer + Send + Sync>, custom_words: Vec<String>) -> Self {
        Self {
            recognizer,
            custom_words,
        }
    }

    /// The recognition pass blocks, so it runs on tokio's blocking pool;
    /// this future suspends once while it runs and yields no partial results.
    pub async fn extract(
        &self,
        photo: &Photo,
        progress: ProgressFn<'_>,
    ) -> Result<Vec<String>, ExtractionError> {
        progress("Initializing text recognition...");
        let pixels = photo.to_pixel_buffer()?;
        let request = RecognitionRequest::accurate(recognition_vocabulary(&self.custom_words));

        let span = tracing::info_span!(
            "local_ocr_extract",
            width = pixels.width(),
            height = pixels.height(),
            vocabulary = request.custom_words.len(),
        );
        let start = std::time::Instant::now();

        progress("Processing image with text recognition...");
        let recognizer = Arc::clone(&self.recognizer);
        let regions = tokio::task::spawn_blocking(move || recognizer.recognize(&pixels, &request))
            .instrument(span.clone())
            .await
            .map_err(|e| ExtractionError::Recognition(format!("recognition task failed: {e}")))??;

        progress("Extracting text from image...");
        let items = items_from_regions(&regions);

        span.in_scope(|| {
            info!(
                regions = regions.len(),
                items = items.len(),
                elapsed_ms = %start.elapsed().as_millis(),
                "Local text recognition complete"
            )
        });
        Ok(items)
    }
}

/// Top-ranked transcription of each region, normalized, in detection order.
pub fn items_from_regions(regions: &[TextRegion]) -> Vec<String> {
    normalize_items(
        regions
            .iter()
            .filter_map(TextRegion::top_candidate)
            .map(|c| c.text.as_str()),
    )
}

// ──────────────────────────────────────────────
// Engine selection
// ──────────────────────────────────────────────

/// Build the recognizer, respecting feature flags.
pub fn build_recognizer() -> Arc<dyn TextRecognizer + Send + Sync> {
    #[cfg(feature = "ocr")]
    {
        match find_tessdata_dir() {
            Some(tessdata) => match TesseractRecognizer::new(&tessdata) {
                Ok(engine) => {
                    info!(tessdata = %tessdata.display(), "Tesseract OCR initialized");
                    return Arc::new(engine);
                }
                Err(e) => tracing::warn!(error = %e, "Tesseract OCR initialization failed"),
            },
            None => tracing::warn!("Tesseract data not found, local extraction unavailable"),
        }
    }

    info!("Local text recognition unavailable in this build");
    Arc::new(UnavailableRecognizer)
}

/// Recognizer used when no engine is compiled in or installed.
pub struct UnavailableRecognizer;

impl TextRecognizer for UnavailableRecognizer {
    fn recognize(
        &self,
        _pixels: &GrayImage,
        _request: &RecognitionRequest,
    ) -> Result<Vec<TextRegion>, ExtractionError> {
        Err(ExtractionError::Recognition(
            "local text recognition is not available; install Tesseract and build with the `ocr` feature".into(),
        ))
    }
}

// ──────────────────────────────────────────────
// Tesseract
// ──────────────────────────────────────────────

/// Language pack the recognizer loads.
#[cfg(feature = "ocr")]
const TESSERACT_LANGUAGE: &str = "eng";

/// Tesseract-backed recognizer.
/// Only available when compiled with the `ocr` feature flag.
///
/// Each call initializes a fresh engine, since the vocabulary and
/// correction settings are only honored at initialization.
#[cfg(feature = "ocr")]
pub struct TesseractRecognizer {
    tessdata_dir: std::path::PathBuf,
}

#[cfg(feature = "ocr")]
impl TesseractRecognizer {
    pub fn new(tessdata_dir: &std::path::Path) -> Result<Self, ExtractionError> {
        if !tessdata_dir
            .join(format!("{TESSERACT_LANGUAGE}.traineddata"))
            .exists()
        {
            return Err(ExtractionError::Recognition(format!(
                "tessdata not found at {}",
                tessdata_dir.display()
            )));
        }
        Ok(Self {
            tessdata_dir: tessdata_dir.to_path_buf(),
        })
    }
}

#[cfg(feature = "ocr")]
impl TextRecognizer for TesseractRecognizer {
    fn recognize(
        &self,
        pixels: &GrayImage,
        request: &RecognitionRequest,
    ) -> Result<Vec<TextRegion>, ExtractionError> {
        use std::io::Write;

        let engine_err = |e: String| ExtractionError::Recognition(e);

        // Must outlive engine initialization, which is when Tesseract reads it.
        let words_file = if request.custom_words.is_empty() {
            None
        } else {
            let mut file = tempfile::NamedTempFile::new()
                .map_err(|e| engine_err(format!("vocabulary file: {e}")))?;
            for word in &request.custom_words {
                writeln!(file, "{word}").map_err(|e| engine_err(format!("vocabulary file: {e}")))?;
            }
            file.flush()
                .map_err(|e| engine_err(format!("vocabulary file: {e}")))?;
            Some(file)
        };
        let words_path = match &words_file {
            Some(file) => Some(
                file.path()
                    .to_str()
                    .ok_or_else(|| engine_err("invalid vocabulary file path".into()))?,
            ),
            None => None,
        };

        let tessdata = self
            .tessdata_dir
            .to_str()
            .ok_or_else(|| engine_err("invalid tessdata path".into()))?;
        let variables = init_variables(request, words_path);

        let mut engine = tess::Engine::init(tessdata, TESSERACT_LANGUAGE, &variables)
            .map_err(engine_err)?;
        let tsv = engine.tsv_text(pixels).map_err(engine_err)?;

        let min_height = (pixels.height() as f32 * request.minimum_text_height).ceil() as u32;
        Ok(regions_from_tsv(&tsv, min_height))
    }
}

/// Engine variables that must be in place when Tesseract initializes.
#[cfg(any(feature = "ocr", test))]
fn init_variables(
    request: &RecognitionRequest,
    words_path: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut vars = vec![(
        "tessedit_enable_dict_correction",
        if request.language_correction { "1" } else { "0" }.to_string(),
    )];
    if let Some(path) = words_path {
        vars.push(("user_words_file", path.to_string()));
    }
    vars
}

/// Thin owner of a raw Tesseract handle.
///
/// The wrapper crate only exposes post-init `set_variable`, which Tesseract
/// ignores for dictionary settings, so initialization goes through the C API.
#[cfg(feature = "ocr")]
mod tess {
    use std::ffi::{CStr, CString};
    use std::os::raw::c_char;
    use std::ptr::NonNull;

    use image::GrayImage;

    const SOURCE_PPI: i32 = 300;

    pub struct Engine(NonNull<tesseract_sys::TessBaseAPI>);

    impl Engine {
        /// Create and initialize with the default engine mode and `variables`.
        pub fn init(
            tessdata: &str,
            language: &str,
            variables: &[(&str, String)],
        ) -> Result<Self, String> {
            let cstr = |s: &str| CString::new(s).map_err(|e| format!("invalid engine argument: {e}"));
            let datapath = cstr(tessdata)?;
            let language = cstr(language)?;
            let names = variables
                .iter()
                .map(|(name, _)| cstr(*name))
                .collect::<Result<Vec<_>, _>>()?;
            let values = variables
                .iter()
                .map(|(_, value)| cstr(value.as_str()))
                .collect::<Result<Vec<_>, _>>()?;
            let mut name_ptrs: Vec<*mut c_char> =
                names.iter().map(|n| n.as_ptr() as *mut c_char).collect();
            let mut value_ptrs: Vec<*mut c_char> =
                values.iter().map(|v| v.as_ptr() as *mut c_char).collect();

            // SAFETY: a null handle is reported as an error; otherwise it is
            // owned by `Engine` and freed in `Drop`.
            let handle = NonNull::new(unsafe { tesseract_sys::TessBaseAPICreate() })
                .ok_or_else(|| "Failed to create Tesseract engine".to_string())?;
            let engine = Self(handle);

            // SAFETY: every pointer refers to a live NUL-terminated string for
            // the duration of the call; Tesseract copies what it keeps.
            let status = unsafe {
                tesseract_sys::TessBaseAPIInit4(
                    engine.0.as_ptr(),
                    datapath.as_ptr(),
                    language.as_ptr(),
                    tesseract_sys::TessOcrEngineMode_OEM_DEFAULT,
                    std::ptr::null_mut(),
                    0,
                    name_ptrs.as_mut_ptr(),
                    value_ptrs.as_mut_ptr(),
                    name_ptrs.len() as _,
                    0,
                )
            };
            if status != 0 {
                return Err(format!("Tesseract initialization failed with status {status}"));
            }
            Ok(engine)
        }

        /// Recognize `pixels` and return Tesseract's TSV page layout.
        pub fn tsv_text(&mut self, pixels: &GrayImage) -> Result<String, String> {
            let (width, height) = pixels.dimensions();
            if width == 0 || height == 0 {
                return Err("empty image".into());
            }

            // SAFETY: the buffer is `width * height` 8-bit pixels, one byte per
            // pixel with no row padding, and outlives recognition below.
            let text = unsafe {
                tesseract_sys::TessBaseAPISetImage(
                    self.0.as_ptr(),
                    pixels.as_raw().as_ptr(),
                    width as _,
                    height as _,
                    1,
                    width as _,
                );
                tesseract_sys::TessBaseAPISetSourceResolution(self.0.as_ptr(), SOURCE_PPI);
                tesseract_sys::TessBaseAPIGetTsvText(self.0.as_ptr(), 0)
            };
            if text.is_null() {
                return Err("Tesseract returned no text".into());
            }

            // SAFETY: non-null result is a NUL-terminated string owned by us
            // until passed back to `TessDeleteText`.
            let tsv = unsafe {
                let owned = CStr::from_ptr(text).to_string_lossy().into_owned();
                tesseract_sys::TessDeleteText(text);
                owned
            };
            Ok(tsv)
        }
    }

    impl Drop for Engine {
        fn drop(&mut self) {
            // SAFETY: the handle came from `TessBaseAPICreate` and is freed once.
            unsafe { tesseract_sys::TessBaseAPIDelete(self.0.as_ptr()) }
        }
    }
}

/// Locate tessdata directory from environment or system paths.
#[cfg(feature = "ocr")]
fn find_tessdata_dir() -> Option<std::path::PathBuf> {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&path);
        if p.join("eng.traineddata").exists() {
            return Some(p);
        }
    }

    [
        "/usr/share/tesseract-ocr/5/tessdata",
        "/usr/share/tesseract-ocr/4.00/tessdata",
        "/usr/share/tessdata",
        "/usr/local/share/tessdata",
        "/opt/homebrew/share/tessdata",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.join("eng.traineddata").exists())
}

/// Group Tesseract TSV word rows into line regions.
///
/// TSV columns: level page block par line word left top width height conf text.
/// Level 4 rows carry the line box, level 5 rows the words. Lines shorter
/// than `min_height` pixels are dropped; confidence is the mean word confidence.
#[cfg(any(feature = "ocr", test))]
fn regions_from_tsv(tsv: &str, min_height: u32) -> Vec<TextRegion> {
    use super::types::{BoundingBox, RecognizedCandidate};

    struct Line {
        key: [u32; 4],
        bounding_box: Option<BoundingBox>,
        words: Vec<String>,
        confidences: Vec<f32>,
    }

    let mut lines: Vec<Line> = Vec::new();

    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 11 {
            continue;
        }
        let nums: Vec<u32> = fields[1..5].iter().filter_map(|f| f.parse().ok()).collect();
        let (Ok(level), [page, block, par, line]) = (fields[0].parse::<u32>(), nums.as_slice())
        else {
            continue;
        };
        let key = [*page, *block, *par, *line];

        match level {
            4 => lines.push(Line {
                key,
                bounding_box: parse_bounding_box(&fields[6..10]),
                words: Vec::new(),
                confidences: Vec::new(),
            }),
            5 => {
                let word = fields.get(11).map(|w| w.trim()).unwrap_or("");
                if word.is_empty() {
                    continue;
                }
                if lines.last().map(|l| l.key) != Some(key) {
                    lines.push(Line {
                        key,
                        bounding_box: None,
                        words: Vec::new(),
                        confidences: Vec::new(),
                    });
                }
                if let Some(current) = lines.last_mut() {
                    current.words.push(word.to_string());
                    // Tesseract returns -1 for words it can't assign confidence to
                    let conf: f32 = fields[10].parse().unwrap_or(-1.0);
                    current.confidences.push(if conf < 0.0 { 0.0 } else { conf / 100.0 });
                }
            }
            _ => {}
        }
    }

    lines
        .into_iter()
        .filter(|l| !l.words.is_empty())
        .filter(|l| l.bounding_box.map_or(true, |b| b.height >= min_height))
        .map(|l| {
            let confidence = l.confidences.iter().sum::<f32>() / l.confidences.len() as f32;
            TextRegion {
                candidates: vec![RecognizedCandidate {
                    text: l.words.join(" "),
                    confidence,
                }],
                bounding_box: l.bounding_box,
            }
        })
        .collect()
}

#[cfg(any(feature = "ocr", test))]
fn parse_bounding_box(fields: &[&str]) -> Option<super::types::BoundingBox> {
    Some(super::types::BoundingBox {
        x: fields.first()?.parse().ok()?,
        y: fields.get(1)?.parse().ok()?,
        width: fields.get(2)?.parse().ok()?,
        height: fields.get(3)?.parse().ok()?,
    })
}

// ──────────────────────────────────────────────
// MockRecognizer (testing)
// ──────────────────────────────────────────────

/// Mock recognizer for testing without a native engine.
///
/// Returns configured regions (or a configured failure) and records every
/// request it receives.
pub struct MockRecognizer {
    regions: Vec<TextRegion>,
    failure: Option<String>,
    requests: Mutex<Vec<RecognitionRequest>>,
}

impl MockRecognizer {
    /// One single-candidate region per line.
    pub fn new(lines: &[&str]) -> Self {
        Self::with_regions(lines.iter().map(|l| TextRegion::single(l, 0.9)).collect())
    }

    pub fn with_regions(regions: Vec<TextRegion>) -> Self {
        Self {
            regions,
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            regions: Vec::new(),
            failure: Some(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> Option<RecognitionRequest> {
        self.requests.lock().ok()?.last().cloned()
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(
        &self,
        _pixels: &GrayImage,
        request: &RecognitionRequest,
    ) -> Result<Vec<TextRegion>, ExtractionError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        match &self.failure {
            Some(message) => Err(ExtractionError::Recognition(message.clone())),
            None => Ok(self.regions.clone()),
        }
    }
}
