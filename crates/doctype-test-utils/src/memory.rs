use std::collections::HashMap;

use doctype_client::{ClientError, DoctypeApi, Result};
use doctype_meta::{DoctypeInfo, FieldType, ListPage, ListQuery, OptionItem, Record};
use parking_lot::Mutex;

/// Backend kept in memory
///
/// Resolves Link option lists from stored records the way the real
/// `list_info` does, counts calls per method and can be told to fail.
#[derive(Debug, Default)]
pub struct InMemoryDoctypeApi {
    infos: Mutex<HashMap<String, DoctypeInfo>>,
    records: Mutex<HashMap<String, Vec<Record>>>,
    sequence: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, (u16, String)>>,
}

impl InMemoryDoctypeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doctype(self, doctype: &str, info: DoctypeInfo) -> Self {
        self.infos.lock().insert(doctype.to_string(), info);
        self
    }

    pub fn with_record(self, doctype: &str, record: Record) -> Self {
        self.store(doctype, record);
        self
    }

    /// Every call of `method` fails with this status until cleared
    pub fn fail_on(&self, method: &str, status: u16, message: &str) {
        self.failures
            .lock()
            .insert(method.to_string(), (status, message.to_string()));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == method).count()
    }

    pub fn records(&self, doctype: &str) -> Vec<Record> {
        self.records.lock().get(doctype).cloned().unwrap_or_default()
    }

    pub fn record(&self, doctype: &str, id: &str) -> Option<Record> {
        self.records(doctype).into_iter().find(|r| r.id() == Some(id))
    }

    fn enter(&self, method: &str) -> Result<()> {
        self.calls.lock().push(method.to_string());
        match self.failures.lock().get(method) {
            Some((status, message)) => Err(ClientError::Status {
                status: *status,
                message: message.clone(),
                body: Some(serde_json::json!({ "message": message })),
            }),
            None => Ok(()),
        }
    }

    fn store(&self, doctype: &str, mut record: Record) -> Record {
        let id = match record.id() {
            Some(id) => id.to_string(),
            None => {
                let mut sequence = self.sequence.lock();
                let next = sequence.entry(doctype.to_string()).or_insert(0);
                *next += 1;
                format!("{}-{:04}", doctype.to_uppercase().replace(' ', "-"), next)
            }
        };
        record.insert("name", id.clone().into());
        record.insert("id", id.into());
        self.records
            .lock()
            .entry(doctype.to_string())
            .or_default()
            .push(record.clone());
        record
    }

    fn options_of(&self, doctype: &str) -> Vec<OptionItem> {
        self.records(doctype)
            .iter()
            .filter_map(Record::id)
            .map(OptionItem::plain)
            .collect()
    }

    fn not_found(what: String) -> ClientError {
        ClientError::Status {
            status: 404,
            message: what.clone(),
            body: Some(serde_json::json!({ "message": what })),
        }
    }
}

#[async_trait::async_trait]
impl DoctypeApi for InMemoryDoctypeApi {
    async fn list_info(&self, doctype: &str, fields: &[String]) -> Result<DoctypeInfo> {
        self.enter("list_info")?;
        let mut info = self
            .infos
            .lock()
            .get(doctype)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("DocType {doctype} not found")))?;
        if !fields.is_empty() {
            info.fields.retain(|f| fields.contains(&f.fieldname));
            info.field_order.retain(|f| fields.contains(f));
        }
        for field in &mut info.fields {
            if field.fieldtype == FieldType::Link {
                if let Some(target) = field.link_target().map(str::to_string) {
                    let options = self.options_of(&target);
                    if !options.is_empty() {
                        field.options_list = options;
                    }
                }
            }
        }
        Ok(info)
    }

    async fn list_data(&self, query: &ListQuery) -> Result<ListPage> {
        self.enter("list_data")?;
        let matched: Vec<Record> = self
            .records(&query.doctype)
            .into_iter()
            .filter(|r| query.matches(r))
            .collect();
        let rows = matched
            .iter()
            .skip(query.offset())
            .take(query.page_length as usize)
            .map(|r| {
                if query.fields.is_empty() {
                    return r.clone();
                }
                r.iter()
                    .filter(|(k, _)| *k == "id" || *k == "name" || query.fields.contains(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .collect();
        Ok(ListPage {
            total: matched.len() as u64,
            rows,
        })
    }

    async fn single_data(&self, doctype: &str, id: &str) -> Result<Record> {
        self.enter("single_data")?;
        Ok(self.record(doctype, id).unwrap_or_default())
    }

    async fn create(&self, doctype: &str, record: &Record) -> Result<Record> {
        self.enter("create")?;
        Ok(self.store(doctype, record.clone()))
    }

    async fn update(&self, doctype: &str, id: &str, record: &Record) -> Result<Record> {
        self.enter("update")?;
        let mut records = self.records.lock();
        let stored = records
            .get_mut(doctype)
            .and_then(|rows| rows.iter_mut().find(|r| r.id() == Some(id)))
            .ok_or_else(|| Self::not_found(format!("{doctype} {id} not found")))?;
        stored.merge(record);
        stored.insert("name", id.into());
        stored.insert("id", id.into());
        Ok(stored.clone())
    }

    async fn delete(&self, doctype: &str, ids: &[String]) -> Result<()> {
        self.enter("delete")?;
        if let Some(rows) = self.records.lock().get_mut(doctype) {
            rows.retain(|r| !r.id().is_some_and(|id| ids.iter().any(|d| d == id)));
        }
        Ok(())
    }
}
