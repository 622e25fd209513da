//! Shared test utilities: catalog fixtures and source images on disk.

use crate::naming::epoch;
use crate::report::{EventKind, ExportEvent, Reporter};
use chrono::{Local, NaiveDate, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Timer interval of local noon on `date`
pub fn interval_for(date: NaiveDate) -> f64 {
    let noon = Local
        .from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
        .earliest()
        .unwrap();
    (noon - epoch().unwrap()).num_seconds() as f64
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Builds `AlbumData.xml` documents
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    albums: Vec<String>,
    images: Vec<(String, String)>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn album(self, name: &str, image_ids: &[&str]) -> Self {
        let keys: String = image_ids
            .iter()
            .map(|id| format!("\n\t\t\t\t<string>{}</string>", escape(id)))
            .collect();
        self.raw_album(&format!(
            "<key>RollID</key>\n\t\t\t<integer>1</integer>\n\t\t\t\
             <key>RollName</key>\n\t\t\t<string>{}</string>\n\t\t\t\
             <key>RollDateAsTimerInterval</key>\n\t\t\t<real>402000000.000000</real>\n\t\t\t\
             <key>KeyList</key>\n\t\t\t<array>{}\n\t\t\t</array>",
            escape(name),
            keys
        ))
    }

    pub fn raw_album(mut self, body: &str) -> Self {
        self.albums
            .push(format!("\t\t<dict>\n\t\t\t{}\n\t\t</dict>\n", body));
        self
    }

    pub fn image(self, id: &str, path: &str, interval: f64) -> Self {
        self.raw_image(
            id,
            &format!(
                "<key>MediaType</key>\n\t\t\t<string>Image</string>\n\t\t\t\
                 <key>ImagePath</key>\n\t\t\t<string>{}</string>\n\t\t\t\
                 <key>DateAsTimerInterval</key>\n\t\t\t<real>{:.6}</real>",
                escape(path),
                interval
            ),
        )
    }

    pub fn raw_image(mut self, id: &str, body: &str) -> Self {
        self.images.push((id.to_string(), body.to_string()));
        self
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
             <plist version=\"1.0\">\n<dict>\n\
             \t<key>Application Version</key>\n\t<string>9.5.1 (910.29)</string>\n\
             \t<key>List of Rolls</key>\n\t<array>\n",
        );
        for album in &self.albums {
            xml.push_str(album);
        }
        xml.push_str("\t</array>\n\t<key>Master Image List</key>\n\t<dict>\n");
        for (id, body) in &self.images {
            xml.push_str(&format!(
                "\t\t<key>{}</key>\n\t\t<dict>\n\t\t\t{}\n\t\t</dict>\n",
                escape(id),
                body
            ));
        }
        xml.push_str("\t</dict>\n</dict>\n</plist>\n");
        xml
    }
}

/// A catalog with its source images inside a temp directory
pub struct Fixture {
    pub dir: TempDir,
    pub catalog_path: PathBuf,
    pub output: PathBuf,
}

impl Fixture {
    /// Two albums, two images each:
    /// "Summer Party" (first photo on 2013-10-02) and "2013-10-10 Fall Supper"
    pub fn two_albums() -> Self {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("Masters");
        fs::create_dir_all(&source).unwrap();

        let mut builder = CatalogBuilder::new();
        let photos = [
            ("1", "IMG_0001.jpg", NaiveDate::from_ymd_opt(2013, 10, 2).unwrap()),
            ("2", "IMG_0002.jpg", NaiveDate::from_ymd_opt(2013, 10, 3).unwrap()),
            ("3", "IMG_0003.jpg", NaiveDate::from_ymd_opt(2013, 10, 10).unwrap()),
            ("4", "IMG_0004.jpg", NaiveDate::from_ymd_opt(2013, 10, 10).unwrap()),
        ];
        for (id, file_name, date) in photos {
            let path = source.join(file_name);
            fs::write(&path, format!("jpeg bytes of {}", file_name)).unwrap();
            builder = builder.image(id, path.to_str().unwrap(), interval_for(date));
        }
        let builder = builder
            .album("Summer Party", &["1", "2"])
            .album("2013-10-10 Fall Supper", &["3", "4"]);

        Self::with_catalog(dir, &builder)
    }

    /// Write `builder`'s catalog into `dir`
    pub fn with_catalog(dir: TempDir, builder: &CatalogBuilder) -> Self {
        let catalog_path = dir.path().join("AlbumData.xml");
        fs::write(&catalog_path, builder.to_xml()).unwrap();
        let output = dir.path().join("backup");
        Self {
            dir,
            catalog_path,
            output,
        }
    }

    /// Create a source file under the fixture directory
    pub fn source_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join("Masters").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    /// Names of the files exported into `folder`, sorted
    pub fn exported(&self, folder: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.output.join(folder))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Keeps every reported event as its kind and rendered line
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<(EventKind, String)>,
}

impl Reporter for RecordingReporter {
    fn report(&mut self, event: &ExportEvent<'_>) {
        self.events.push((event.kind(), event.to_string()));
    }
}

impl RecordingReporter {
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.iter().map(|(kind, _)| *kind).collect()
    }

    pub fn lines_of(&self, kind: EventKind) -> Vec<String> {
        self.events
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, line)| line.clone())
            .collect()
    }
}
