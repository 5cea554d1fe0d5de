//! Loopback protocol clients
//!
//! Stand-ins for the real downstream systems: they accept the same calls
//! the wire clients would, write what they receive as files under an
//! output directory, and answer with well-formed acknowledgements. This
//! makes a full fan-out run executable on a laptop with no listeners.
//!
//! Simulated payload items are plain text files carrying `key=value`
//! header lines (`study_uid`, `series_uid`, `modality`); anything that
//! does not parse is rejected the way a real transfer would reject a
//! corrupt instance.

use crate::adapters::traits::{
    DocumentClient, DocumentSubmission, Hl7Client, Hl7Message, Hl7Profile, ImagingClient,
    ImagingSession, InstanceAssignment, InstanceInfo, OrderFields, PatientFields, SubmitResponse,
    TemplateParams,
};
use crate::domain::{RegsimError, Result, TransportError};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

fn sanitize(endpoint: &str) -> String {
    endpoint
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// HL7 client that writes messages to disk and acknowledges them
pub struct LoopbackHl7Client {
    out_dir: PathBuf,
    control_id: AtomicU64,
}

impl LoopbackHl7Client {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            control_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl Hl7Client for LoopbackHl7Client {
    fn build(
        &self,
        profile: Hl7Profile,
        patient: &PatientFields,
        order: Option<&OrderFields>,
    ) -> Result<Hl7Message> {
        let control_id = self.control_id.fetch_add(1, Ordering::SeqCst);
        let message_type = match profile {
            Hl7Profile::Admit => "ADT^A04",
            Hl7Profile::Order => "ORM^O01",
            Hl7Profile::Report => "ORU^R01",
        };
        let mut segments = vec![
            format!("MSH|^~\\&|REGSIM|REGSIM||{message_type}|{control_id}|P|2.3.1"),
            format!(
                "PID|1||{}^^^{}~{}^^^GLOBAL||{}||{}|{}|||{}^^{}^{}^{}^{}",
                patient.local_id,
                patient.assigning_authority,
                patient.global_id,
                patient.name,
                patient.birth_date,
                patient.sex,
                patient.street,
                patient.city,
                patient.state,
                patient.zip,
                patient.country,
            ),
        ];

        match profile {
            Hl7Profile::Admit => {}
            Hl7Profile::Order | Hl7Profile::Report => {
                let order = order.ok_or_else(|| {
                    RegsimError::Other(format!(
                        "order fields required for the {} profile",
                        profile.name()
                    ))
                })?;
                segments.push(format!(
                    "ORC|NW|{}|{}|||||||||{}",
                    order.placer_order_number, order.filler_order_number, order.ordering_provider,
                ));
                segments.push(format!(
                    "OBR|1|{}|{}|{}|||{}|||||||||{}||{}|{}|{}|||{}",
                    order.placer_order_number,
                    order.filler_order_number,
                    order.universal_service_id,
                    order.date_time,
                    order.ordering_provider,
                    order.accession_number,
                    order.requested_procedure_id,
                    order.scheduled_step_id,
                    order.diagnostic_service_id,
                ));
                segments.push(format!("ZDS|{}^^Application^DICOM", order.study_uid));
                if let Some(report_text) = &order.report_text {
                    segments.push(format!("OBX|1|TX|||{report_text}||||||F"));
                }
            }
        }

        Ok(Hl7Message {
            profile,
            text: segments.join("\r"),
        })
    }

    async fn send(&self, message: &Hl7Message, endpoint: &str, _timeout: Duration) -> Result<String> {
        let dir = self.out_dir.join("hl7").join(sanitize(endpoint));
        std::fs::create_dir_all(&dir)?;
        let n = self.control_id.fetch_add(1, Ordering::SeqCst);
        let file = dir.join(format!("{n:06}_{}.hl7", message.profile.name()));
        std::fs::write(&file, &message.text)?;
        tracing::debug!(file = %file.display(), "Loopback HL7 message accepted");
        Ok(format!(
            "MSH|^~\\&|LOOPBACK|LOOPBACK||ACK|{n}|P|2.3.1\rMSA|AA|{n}"
        ))
    }
}

/// Imaging client reading simulated instance files
pub struct LoopbackImagingClient {
    out_dir: PathBuf,
}

impl LoopbackImagingClient {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

#[async_trait]
impl ImagingClient for LoopbackImagingClient {
    fn describe(&self, item: &Path) -> Result<InstanceInfo> {
        let content = std::fs::read_to_string(item).map_err(|e| {
            TransportError::RejectedItem(format!("{}: {e}", item.display()))
        })?;

        let mut study_uid = None;
        let mut series_uid = None;
        let mut modality = None;
        for line in content.lines() {
            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "study_uid" => study_uid = Some(value.trim().to_string()),
                    "series_uid" => series_uid = Some(value.trim().to_string()),
                    "modality" => modality = Some(value.trim().to_string()),
                    _ => {}
                }
            }
        }

        match (study_uid, series_uid, modality) {
            (Some(study_uid), Some(series_uid), Some(modality))
                if !study_uid.is_empty() && !series_uid.is_empty() =>
            {
                Ok(InstanceInfo {
                    study_uid,
                    series_uid,
                    modality,
                })
            }
            _ => Err(TransportError::RejectedItem(format!(
                "{}: not a simulated instance",
                item.display()
            ))
            .into()),
        }
    }

    async fn open(&self, endpoint: &str, _timeout: Duration) -> Result<Box<dyn ImagingSession>> {
        let dir = self.out_dir.join("imaging").join(sanitize(endpoint));
        std::fs::create_dir_all(&dir).map_err(|e| TransportError::ConnectionFailed {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        Ok(Box::new(LoopbackImagingSession { dir }))
    }
}

struct LoopbackImagingSession {
    dir: PathBuf,
}

#[derive(Serialize)]
struct StoredInstance<'a> {
    source: String,
    #[serde(flatten)]
    assignment: &'a InstanceAssignment,
}

#[async_trait]
impl ImagingSession for LoopbackImagingSession {
    async fn send(&mut self, item: &Path, assignment: &InstanceAssignment) -> Result<()> {
        let stored = StoredInstance {
            source: item.display().to_string(),
            assignment,
        };
        let file = self
            .dir
            .join(format!("{:06}.json", assignment.instance_number));
        let body = serde_json::to_string_pretty(&stored)?;
        std::fs::write(file, body)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Document client rendering templates locally and accepting submissions
pub struct LoopbackDocumentClient {
    out_dir: PathBuf,
    submission_seq: AtomicU64,
}

impl LoopbackDocumentClient {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            submission_seq: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl DocumentClient for LoopbackDocumentClient {
    fn build_from_template(&self, source: &Path, params: &TemplateParams) -> Result<String> {
        let template = std::fs::read_to_string(source).map_err(|e| {
            RegsimError::Template(format!("{}: {e}", source.display()))
        })?;
        Ok(params.apply(&template))
    }

    fn render_pdf(&self, source: &Path, params: &TemplateParams) -> Result<Vec<u8>> {
        let rendered = self.build_from_template(source, params)?;
        let mut bytes = b"%PDF-1.4\n".to_vec();
        bytes.extend_from_slice(rendered.as_bytes());
        Ok(bytes)
    }

    async fn submit(
        &self,
        submission: &DocumentSubmission,
        endpoint: &str,
        _timeout: Duration,
    ) -> Result<SubmitResponse> {
        let dir = self.out_dir.join("documents").join(sanitize(endpoint));
        std::fs::create_dir_all(&dir).map_err(|e| TransportError::ConnectionFailed {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        let n = self.submission_seq.fetch_add(1, Ordering::SeqCst);
        let base = dir.join(format!("{n:06}"));
        std::fs::write(base.with_extension("doc_entry.xml"), &submission.doc_entry)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        std::fs::write(
            base.with_extension("submission_set.xml"),
            &submission.submission_set,
        )
        .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        if let Some(document) = &submission.document {
            std::fs::write(base.with_extension("document.xml"), document)
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        }
        if let Some(pdf) = &submission.pdf {
            std::fs::write(base.with_extension("pdf"), pdf)
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        }

        tracing::debug!(submission = %base.display(), title = %submission.title, "Loopback submission accepted");
        Ok(SubmitResponse::default())
    }
}
