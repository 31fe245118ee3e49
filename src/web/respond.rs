use crate::constants::PLATFORM_FIELD;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::platform::Platform;
use crate::storage::StorageBackend;
use crate::survey::{self, QuestionKind, QuestionSchema, SubmissionForm, SurveyError};
use crate::survey::{SurveyHeader, UploadedFile};
use crate::{app_config, rate_limit};
use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use futures::{StreamExt, TryStreamExt};
use serde_json::json;

/// Query parameters consulted for a platform override, in order.
const OVERRIDE_PARAMS: [&str; 3] = [PLATFORM_FIELD, "ref", "utm_source"];

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_respond).service(submit_survey);
}

/// One question as rendered on the response form.
pub struct FieldView {
    pub name: String,
    pub text: String,
    pub required: bool,
    /// Which input to render: text, date, choice, multi, rating, slider or file.
    pub input: &'static str,
    pub options: Vec<String>,
    pub accept: String,
    pub max_size_mb: Option<i32>,
}

impl From<QuestionSchema> for FieldView {
    fn from(q: QuestionSchema) -> Self {
        let kind = QuestionKind::from_tag(&q.qtype);
        let input = match kind {
            QuestionKind::MultipleChoice => "choice",
            QuestionKind::Checkboxes | QuestionKind::MultipleSelection => "multi",
            QuestionKind::Rating => "rating",
            QuestionKind::Slider => "slider",
            QuestionKind::DatePicker => "date",
            QuestionKind::FileUpload => "file",
            QuestionKind::TextResponse | QuestionKind::Other(_) => "text",
        };
        let (options, accept) = match kind {
            QuestionKind::Rating => (
                (crate::constants::RATING_MIN..=crate::constants::RATING_MAX)
                    .map(|n| n.to_string())
                    .collect(),
                String::new(),
            ),
            QuestionKind::FileUpload => (Vec::new(), q.options.join(",")),
            _ => (q.options, String::new()),
        };

        Self {
            name: SubmissionForm::field_name(q.id),
            text: q.text,
            required: q.required,
            input,
            options,
            accept,
            max_size_mb: q.max_size_mb,
        }
    }
}

#[derive(Template)]
#[template(path = "respond.html")]
pub struct RespondTemplate {
    pub client: ClientCtx,
    pub survey: SurveyHeader,
    pub fields: Vec<FieldView>,
    pub platform: String,
}

fn header_str<'a>(req: &'a HttpRequest, name: header::HeaderName) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

fn query_params(req: &HttpRequest) -> Vec<(String, String)> {
    url::form_urlencoded::parse(req.query_string().as_bytes())
        .into_owned()
        .collect()
}

fn query_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[get("/survey/respond/{survey_id}")]
pub async fn view_respond(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse, SurveyError> {
    let schema = survey::fetch_schema(get_db_pool(), path.into_inner(), client.get_id()).await?;

    // Carry a recognised override from the share link into the form.
    let params = query_params(&req);
    let platform = OVERRIDE_PARAMS
        .iter()
        .filter_map(|key| query_value(&params, key))
        .find_map(Platform::from_override)
        .map(|p| p.label().to_string())
        .unwrap_or_default();

    Ok(RespondTemplate {
        client,
        survey: schema.survey,
        fields: schema.questions.into_iter().map(FieldView::from).collect(),
        platform,
    }
    .to_response())
}

/// Reads the request body into a [`SubmissionForm`], from multipart or urlencoded data.
async fn read_submission(
    req: &HttpRequest,
    payload: web::Payload,
    limit: usize,
) -> Result<SubmissionForm, SurveyError> {
    let too_large = || SurveyError::validation("Submission is too large");
    let mut form = SubmissionForm::default();

    let is_multipart = header_str(req, header::CONTENT_TYPE)
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .map(|m| m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA)
        .unwrap_or(false);

    if !is_multipart {
        let mut body = web::BytesMut::new();
        let mut payload = payload;
        while let Some(chunk) = payload.next().await {
            let chunk = chunk.map_err(|e| {
                log::debug!("read_submission: payload error: {}", e);
                SurveyError::validation("Error reading submission")
            })?;
            if body.len() + chunk.len() > limit {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        for (name, value) in url::form_urlencoded::parse(&body) {
            form.push_value(&name, value.into_owned());
        }
        return Ok(form);
    }

    let mut multipart = Multipart::new(req.headers(), payload);
    let mut total = 0usize;
    let malformed = |e: actix_multipart::MultipartError| {
        log::debug!("read_submission: multipart error: {}", e);
        SurveyError::validation("Error interpreting submission")
    };

    while let Some(mut field) = multipart.try_next().await.map_err(malformed)? {
        let disposition = field.content_disposition().clone();
        let name = match disposition.get_name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            total += chunk.len();
            if total > limit {
                return Err(too_large());
            }
            data.extend_from_slice(&chunk);
        }

        match disposition.get_filename() {
            Some(filename) => form.insert_file(
                &name,
                UploadedFile {
                    filename: filename.to_string(),
                    content_type: field.content_type().map(|m| m.to_string()),
                    data,
                },
            ),
            None => {
                let value = String::from_utf8(data)
                    .map_err(|_| SurveyError::validation("Submission is not valid UTF-8"))?;
                form.push_value(&name, value);
            }
        }
    }

    Ok(form)
}

#[post("/survey/submit-survey/{survey_id}")]
pub async fn submit_survey(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    payload: web::Payload,
    storage: web::Data<dyn StorageBackend>,
) -> Result<HttpResponse, SurveyError> {
    let survey_id = path.into_inner();

    let ip = crate::ip::client_ip_or_unknown(&req);
    if let Err(e) = rate_limit::check_submission_rate_limit(&ip) {
        log::warn!("Rate limit exceeded for submission: ip={}", ip);
        return Ok(HttpResponse::TooManyRequests().json(json!({ "error": e.to_string() })));
    }

    let config = app_config::get_config();
    let limit = config.limits.max_submission_size_mb as usize * 1024 * 1024;
    let form = read_submission(&req, payload, limit).await?;

    let params = query_params(&req);
    let overrides = std::iter::once(form.first_value(PLATFORM_FIELD))
        .chain(OVERRIDE_PARAMS.iter().map(|key| query_value(&params, key)));
    let platform = Platform::resolve(
        overrides,
        header_str(&req, header::USER_AGENT).unwrap_or(""),
        header_str(&req, header::REFERER),
    );

    let response_id = survey::submit_response(
        get_db_pool(),
        &**storage,
        &config.storage.upload_folder,
        client.get_id(),
        survey_id,
        platform,
        form,
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "response_id": response_id,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use actix_web::FromRequest;

    const BOUNDARY: &str = "surveyor-boundary";

    /// `(field name, filename, bytes)` parts as a multipart/form-data body.
    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    async fn read_multipart(
        parts: &[(&str, Option<&str>, &[u8])],
        limit: usize,
    ) -> Result<SubmissionForm, SurveyError> {
        let (req, mut payload) = TestRequest::post()
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(multipart_body(parts))
            .to_http_parts();
        let payload = web::Payload::from_request(&req, &mut payload)
            .await
            .unwrap();
        read_submission(&req, payload, limit).await
    }

    #[actix_rt::test]
    async fn test_multipart_routes_files_and_values() {
        let mut form = read_multipart(
            &[
                ("q1", None, b"Ada"),
                ("q2", Some("cv.pdf"), b"%PDF-1.4"),
                ("q3", Some(""), b""),
                ("platform", None, b"ig"),
            ],
            1024,
        )
        .await
        .unwrap();

        assert_eq!(form.values_for(1), &["Ada".to_string()][..]);
        assert_eq!(form.first_value("platform"), Some("ig"));
        let file = form.take_file(2).unwrap();
        assert_eq!(file.filename, "cv.pdf");
        assert_eq!(file.data, b"%PDF-1.4".to_vec());
        // An untouched file input arrives empty and is dropped
        assert!(form.take_file(3).is_none());
    }

    #[actix_rt::test]
    async fn test_multipart_over_limit_is_rejected() {
        let big = vec![b'x'; 2048];
        let result = read_multipart(&[("q2", Some("big.bin"), &big)], 1024).await;
        match result {
            Err(SurveyError::Validation(msg)) => assert_eq!(msg, "Submission is too large"),
            other => panic!("oversized body accepted: {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_multipart_text_must_be_utf8() {
        let result = read_multipart(&[("q1", None, &[0xff, 0xfe, 0xfd])], 1024).await;
        assert!(matches!(result, Err(SurveyError::Validation(_))));
    }

    #[actix_rt::test]
    async fn test_urlencoded_over_limit_is_rejected() {
        let (req, mut payload) = TestRequest::post()
            .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
            .set_payload(format!("q1={}", "a".repeat(64)))
            .to_http_parts();
        let payload = web::Payload::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert!(read_submission(&req, payload, 16).await.is_err());
    }

    fn schema(qtype: &str, options: &[&str]) -> QuestionSchema {
        QuestionSchema {
            id: 9,
            text: "Question".to_string(),
            qtype: qtype.to_string(),
            required: false,
            options: options.iter().map(|s| s.to_string()).collect(),
            max_size_mb: None,
        }
    }

    #[test]
    fn test_field_view_inputs() {
        let rating = FieldView::from(schema("Rating (1–5)", &[]));
        assert_eq!(rating.input, "rating");
        assert_eq!(rating.options, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(rating.name, "q9");

        let upload = FieldView::from(schema("File Upload", &[".pdf", ".png"]));
        assert_eq!(upload.input, "file");
        assert_eq!(upload.accept, ".pdf,.png");
        assert!(upload.options.is_empty());

        assert_eq!(FieldView::from(schema("Star sign", &[])).input, "text");
        assert_eq!(FieldView::from(schema("Checkboxes", &["a"])).input, "multi");
    }

    #[test]
    fn test_query_value_first_match() {
        let params = vec![
            ("ref".to_string(), "ig".to_string()),
            ("ref".to_string(), "fb".to_string()),
        ];
        assert_eq!(query_value(&params, "ref"), Some("ig"));
        assert_eq!(query_value(&params, "platform"), None);
    }
}
