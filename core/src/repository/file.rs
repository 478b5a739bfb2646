use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{self, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::RecordError;
use crate::model::period::DateRange;
use crate::model::record::{Collection, Record};
use crate::repository::traits::RecordRepository;

/// JSON-file store: one `<collection>.json` array per collection.
#[derive(Clone)]
pub struct FileRecordRepository {
    base_dir: PathBuf,
}

impl FileRecordRepository {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("Could not create data directory {}", base_dir.display()))?;

        for collection in Collection::ALL {
            let path = base_dir.join(file_name(collection));
            // Ensure the file itself exists; start with an empty array
            if !path.exists() {
                let mut writer = BufWriter::new(File::create(&path)?);
                serde_json::to_writer_pretty(&mut writer, &Vec::<Value>::new())?;
                writer.flush()?;
            }
        }

        Ok(FileRecordRepository { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.base_dir.join(file_name(collection))
    }

    fn read_documents(&self, collection: Collection) -> Result<Vec<Value>> {
        let path = self.path(collection);
        let file = File::open(&path).with_context(|| format!("Could not open {}", path.display()))?;
        let reader = BufReader::new(file);
        let documents = serde_json::from_reader(reader)
            .with_context(|| format!("{} is not a JSON array of documents", path.display()))?;
        Ok(documents)
    }

    fn write_documents(&self, collection: Collection, documents: &[Value]) -> Result<()> {
        let file = File::create(self.path(collection))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, documents)?;
        writer.flush()?;
        Ok(())
    }

    fn position(documents: &[Value], id: &Uuid) -> Option<usize> {
        let id = id.to_string();
        documents
            .iter()
            .position(|doc| doc.get("id").and_then(Value::as_str) == Some(id.as_str()))
    }
}

fn file_name(collection: Collection) -> String {
    format!("{}.json", collection.name())
}

impl RecordRepository for FileRecordRepository {
    fn fetch(&self, collection: Collection, range: Option<DateRange>) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for doc in self.read_documents(collection)? {
            let record = Record::from_document(collection, doc)
                .with_context(|| format!("Invalid document in {}", collection))?;
            if range.map_or(true, |r| r.contains(record.date())) {
                records.push(record);
            }
        }
        records.sort_by(|a, b| a.date().cmp(&b.date()).then(a.created_at().cmp(&b.created_at())));
        debug!(%collection, count = records.len(), ?range, "fetched records");
        Ok(records)
    }

    fn get(&self, collection: Collection, id: &Uuid) -> Result<Record> {
        let mut documents = self.read_documents(collection)?;
        match Self::position(&documents, id) {
            Some(pos) => Record::from_document(collection, documents.swap_remove(pos)),
            None => Err(RecordError::NotFound { collection, id: *id }.into()),
        }
    }

    fn insert(&self, record: Record) -> Result<Record> {
        let collection = record.collection();
        let mut documents = self.read_documents(collection)?;
        documents.push(record.to_document()?);
        self.write_documents(collection, &documents)?;
        info!(%collection, id = %record.id(), "inserted record");
        Ok(record)
    }

    fn update(&self, record: &Record) -> Result<()> {
        let collection = record.collection();
        let mut documents = self.read_documents(collection)?;
        if let Some(pos) = Self::position(&documents, &record.id()) {
            documents[pos] = record.to_document()?;
            self.write_documents(collection, &documents)?;
            info!(%collection, id = %record.id(), "updated record");
            Ok(())
        } else {
            Err(RecordError::NotFound { collection, id: record.id() }.into())
        }
    }

    fn delete(&self, collection: Collection, id: &Uuid) -> Result<()> {
        let mut documents = self.read_documents(collection)?;
        let initial_len = documents.len();
        let id_str = id.to_string();
        documents.retain(|doc| doc.get("id").and_then(Value::as_str) != Some(id_str.as_str()));

        if documents.len() == initial_len {
            return Err(RecordError::NotFound { collection, id: *id }.into());
        }

        self.write_documents(collection, &documents)?;
        info!(%collection, %id, "deleted record");
        Ok(())
    }
}
