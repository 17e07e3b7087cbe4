use {
    crate::{
        ArrayValue, COUNTER_COLLECTION, COUNTER_DOCUMENT, DirectoryError, DirectoryResult,
        DirectoryStore, Document, Fields, MANAGERS_COLLECTION, PARTICIPATION_COLLECTION, Value,
        codec::{
            COUNTER_FIELD, GROUP_FIELD, VOTES_FIELD, counter_from_fields, counter_to_fields,
            manager_from_fields, manager_to_fields, participation_entry_to_value,
            participation_from_fields,
        },
    },
    async_trait::async_trait,
    reqwest::StatusCode,
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    std::time::Duration,
    tally_types::{
        Address, GroupId, ManagerRecord, ParticipationEntry, VoteCounter, document_id,
    },
};

pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

pub const DEFAULT_DATABASE: &str = "(default)";

const PAGE_SIZE: u32 = 300;

/// Connection settings of a Firestore database.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FirestoreConfig {
    /// Root of the REST API. Point this at the emulator for local testing,
    /// e.g. `http://localhost:8080/v1`.
    pub base_url: String,
    pub project_id: String,
    pub database: String,
    /// Web API key, sent as the `key` query parameter.
    pub api_key: Option<String>,
    /// OAuth2 or Firebase ID token, sent as a bearer token.
    pub auth_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FIRESTORE_URL.to_string(),
            project_id: String::new(),
            database: DEFAULT_DATABASE.to_string(),
            api_key: None,
            auth_token: None,
            timeout_secs: 30,
        }
    }
}

/// A `DirectoryStore` backed by Cloud Firestore's REST API.
#[derive(Debug, Clone)]
pub struct FirestoreDirectory {
    inner: reqwest::Client,
    /// `{base_url}/projects/{project}/databases/{database}/documents`
    documents_url: String,
    /// `projects/{project}/databases/{database}/documents`
    documents_root: String,
    api_key: Option<String>,
    auth_token: Option<String>,
}

impl FirestoreDirectory {
    pub fn new(config: FirestoreConfig) -> DirectoryResult<Self> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let documents_root = format!(
            "projects/{}/databases/{}/documents",
            config.project_id, config.database
        );

        Ok(Self {
            inner,
            documents_url: format!("{}/{}", config.base_url.trim_end_matches('/'), documents_root),
            documents_root,
            api_key: config.api_key.filter(|key| !key.is_empty()),
            auth_token: config.auth_token.filter(|token| !token.is_empty()),
        })
    }

    /// Full resource name of a document, as used inside commit requests.
    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.documents_root)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let mut builder = self.inner.request(method, url);

        if let Some(key) = &self.api_key {
            builder = builder.query(&[("key", key)]);
        }

        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }

        builder
    }

    async fn get_document(&self, collection: &str, id: &str) -> DirectoryResult<Option<Document>> {
        let url = format!("{}/{collection}/{id}", self.documents_url);

        tracing::debug!(collection, id, "Fetching document");

        let response = self.request(reqwest::Method::GET, url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        parse_response(response).await.map(Some)
    }

    async fn list_documents(&self, collection: &str) -> DirectoryResult<Vec<Document>> {
        let url = format!("{}/{collection}", self.documents_url);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut builder = self
                .request(reqwest::Method::GET, url.clone())
                .query(&[("pageSize", PAGE_SIZE)]);

            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token)]);
            }

            let page: ListDocumentsResponse = parse_response(builder.send().await?).await?;

            documents.extend(page.documents);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(collection, count = documents.len(), "Listed documents");

        Ok(documents)
    }

    async fn commit(&self, writes: Vec<Write>) -> DirectoryResult<CommitResponse> {
        let url = format!("{}:commit", self.documents_url);

        let response = self
            .request(reqwest::Method::POST, url)
            .json(&CommitRequest { writes })
            .send()
            .await?;

        parse_response(response).await
    }
}

#[async_trait]
impl DirectoryStore for FirestoreDirectory {
    async fn manager(&self, address: &Address) -> DirectoryResult<Option<ManagerRecord>> {
        let id = document_id(address);

        self.get_document(MANAGERS_COLLECTION, &id)
            .await?
            .map(|document| manager_from_fields(&id, &document.fields))
            .transpose()
    }

    async fn managers(&self) -> DirectoryResult<Vec<ManagerRecord>> {
        self.list_documents(MANAGERS_COLLECTION)
            .await?
            .iter()
            .map(|document| manager_from_fields(document.id(), &document.fields))
            .collect()
    }

    async fn put_manager(&self, record: &ManagerRecord) -> DirectoryResult<()> {
        let name = self.document_name(MANAGERS_COLLECTION, &document_id(&record.address));

        self.commit(vec![Write::replace(name, manager_to_fields(record))])
            .await?;

        Ok(())
    }

    async fn add_group_member(
        &self,
        manager: &Address,
        group: GroupId,
        member: Address,
    ) -> DirectoryResult<()> {
        let name = self.document_name(MANAGERS_COLLECTION, &document_id(manager));

        // Group ids are numeric, so the path segment must be quoted.
        let transform = FieldTransform::append_missing(
            format!("{GROUP_FIELD}.`{group}`"),
            Value::string(document_id(&member)),
        );

        match self
            .commit(vec![Write::transform(name, transform).must_exist()])
            .await
        {
            Err(DirectoryError::Status { status: 404, .. }) => {
                Err(DirectoryError::ManagerNotFound { address: *manager })
            },
            res => res.map(|_| ()),
        }
    }

    async fn participation(&self, address: &Address) -> DirectoryResult<Vec<ParticipationEntry>> {
        let id = document_id(address);

        match self.get_document(PARTICIPATION_COLLECTION, &id).await? {
            Some(document) => participation_from_fields(&id, &document.fields),
            None => Ok(Vec::new()),
        }
    }

    async fn append_participation(
        &self,
        address: &Address,
        entry: &ParticipationEntry,
    ) -> DirectoryResult<()> {
        let name = self.document_name(PARTICIPATION_COLLECTION, &document_id(address));
        let transform =
            FieldTransform::append_missing(VOTES_FIELD, participation_entry_to_value(entry));

        self.commit(vec![Write::transform(name, transform)]).await?;

        Ok(())
    }

    async fn vote_counter(&self) -> DirectoryResult<Option<VoteCounter>> {
        self.get_document(COUNTER_COLLECTION, COUNTER_DOCUMENT)
            .await?
            .map(|document| counter_from_fields(COUNTER_DOCUMENT, &document.fields))
            .transpose()
    }

    async fn create_vote_counter(&self) -> DirectoryResult<bool> {
        if self.vote_counter().await?.is_some() {
            return Ok(false);
        }

        let name = self.document_name(COUNTER_COLLECTION, COUNTER_DOCUMENT);
        let write =
            Write::replace(name, counter_to_fields(VoteCounter::default())).must_not_exist();

        match self.commit(vec![write]).await {
            Ok(_) => Ok(true),
            // Another client created it between our read and write.
            Err(DirectoryError::Status { status: 409, .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn increment_vote_counter(&self) -> DirectoryResult<u64> {
        let name = self.document_name(COUNTER_COLLECTION, COUNTER_DOCUMENT);
        let transform = FieldTransform::increment(COUNTER_FIELD, 1);

        let response = match self
            .commit(vec![Write::transform(name, transform).must_exist()])
            .await
        {
            Err(DirectoryError::Status { status: 404, .. }) => {
                return Err(DirectoryError::CounterUninitialized);
            },
            res => res?,
        };

        // The transform result is the field's value after the increment.
        response
            .write_results
            .first()
            .and_then(|result| result.transform_results.first())
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                DirectoryError::malformed(
                    COUNTER_COLLECTION,
                    COUNTER_DOCUMENT,
                    "commit response is missing the increment result",
                )
            })
    }
}

async fn parse_response<T>(response: reqwest::Response) -> DirectoryResult<T>
where
    T: DeserializeOwned,
{
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|res| res.error.message)
            .unwrap_or(body);

        return Err(DirectoryError::Status {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_slice(&response.bytes().await?)?)
}

// ------------------------------- wire types ----------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
struct CommitRequest {
    writes: Vec<Write>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    #[serde(default)]
    write_results: Vec<WriteResult>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct WriteResult {
    #[serde(default)]
    transform_results: Vec<Value>,
}

/// One write of a commit request. Writes without a mask replace the whole
/// document; an empty mask leaves existing fields alone so that only the
/// transforms apply.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Write {
    update: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    update_mask: Option<DocumentMask>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    update_transforms: Vec<FieldTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_document: Option<Precondition>,
}

impl Write {
    fn replace(name: String, fields: Fields) -> Self {
        Self {
            update: Document {
                name,
                fields,
                ..Default::default()
            },
            update_mask: None,
            update_transforms: Vec::new(),
            current_document: None,
        }
    }

    fn transform(name: String, transform: FieldTransform) -> Self {
        Self {
            update: Document {
                name,
                ..Default::default()
            },
            update_mask: Some(DocumentMask::default()),
            update_transforms: vec![transform],
            current_document: None,
        }
    }

    fn must_exist(mut self) -> Self {
        self.current_document = Some(Precondition { exists: true });
        self
    }

    fn must_not_exist(mut self) -> Self {
        self.current_document = Some(Precondition { exists: false });
        self
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
struct DocumentMask {
    field_paths: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
struct Precondition {
    exists: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
struct FieldTransform {
    field_path: String,
    #[serde(flatten)]
    kind: TransformKind,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
enum TransformKind {
    Increment(Value),
    AppendMissingElements(ArrayValue),
}

impl FieldTransform {
    fn increment<P>(field_path: P, by: u64) -> Self
    where
        P: Into<String>,
    {
        Self {
            field_path: field_path.into(),
            kind: TransformKind::Increment(Value::from(by)),
        }
    }

    fn append_missing<P>(field_path: P, value: Value) -> Self
    where
        P: Into<String>,
    {
        Self {
            field_path: field_path.into(),
            kind: TransformKind::AppendMissingElements(ArrayValue {
                values: vec![value],
            }),
        }
    }
}
