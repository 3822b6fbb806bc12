// src/normalize/mod.rs

use tracing::{debug, instrument};

use crate::error::Result;
use crate::fetch::RawSubmission;
use crate::schema::{FieldSchema, FormField};
use crate::table::NormalizedRecord;

pub mod address;
pub mod category;
pub mod extract;
pub mod zipcode;

pub use address::clean_address;
pub use category::SubmissionType;
pub use extract::{extract, Extraction, Fallback};
pub use zipcode::resolve_zipcode;

struct Organization {
    referring_org: Option<String>,
    referring_staff: Option<String>,
    staff_email: Option<String>,
    staff_phone: Option<String>,
}

struct Family {
    contact: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
}

struct BarrierLog {
    description: Option<String>,
    list: Option<String>,
    cause: Option<String>,
    solution: Option<String>,
    solution_path: Option<String>,
}

struct Demographics {
    zipcode: Option<String>,
    age: Option<String>,
    sex: Option<String>,
    ethnicity: Option<String>,
}

/// Turns raw submissions into table rows using a resolved schema.
pub struct SubmissionNormalizer<'a> {
    schema: &'a FieldSchema,
}

impl<'a> SubmissionNormalizer<'a> {
    pub fn new(schema: &'a FieldSchema) -> Self {
        Self { schema }
    }

    /// Normalize every active submission, in payload order.
    #[instrument(level = "debug", skip_all, fields(submissions = submissions.len()))]
    pub fn normalize_all(&self, submissions: &[RawSubmission]) -> Result<Vec<NormalizedRecord>> {
        let mut out = Vec::with_capacity(submissions.len());
        for sub in submissions {
            if let Some(record) = self.normalize(sub)? {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// `Ok(None)` for submissions that are not active.
    pub fn normalize(&self, sub: &RawSubmission) -> Result<Option<NormalizedRecord>> {
        if !sub.is_active() {
            debug!(id = ?sub.id, status = %sub.status, "skipping inactive submission");
            return Ok(None);
        }

        let date = self.field(sub, FormField::Date)?;
        let submission_type =
            SubmissionType::normalize(self.field(sub, FormField::SubmissionType)?.as_deref());
        debug!(date = ?date, %submission_type, "normalizing submission");

        let org = self.organization(sub)?;
        let family = self.family(sub)?;
        let log = self.barrier_log(sub)?;
        let demo = self.demographics(sub)?;

        let zipcode = resolve_zipcode(demo.zipcode, family.address.as_deref());

        Ok(Some(NormalizedRecord {
            date,
            submission_type,
            age: demo.age,
            sex: demo.sex,
            ethnicity: demo.ethnicity,
            barrier_description: log.description,
            barrier_list: log.list,
            barrier_cause: log.cause,
            barrier_solution: log.solution,
            solution_path: log.solution_path,
            referring_org: org.referring_org,
            referring_staff: org.referring_staff,
            staff_email: org.staff_email,
            staff_phone: org.staff_phone,
            family_contact: family.contact,
            family_address: family.address,
            family_phone: family.phone,
            family_email: family.email,
            zipcode,
        }))
    }

    fn field(&self, sub: &RawSubmission, field: FormField) -> Result<Option<String>> {
        let slot = self.schema.slot(field)?;
        let value = extract(sub.answer(slot), field.extraction());
        debug!(field = field.label(), present = value.is_some(), "extracted");
        Ok(value)
    }

    fn organization(&self, sub: &RawSubmission) -> Result<Organization> {
        Ok(Organization {
            referring_org: self.field(sub, FormField::ReferringOrganization)?,
            referring_staff: self.field(sub, FormField::ReferringStaffName)?,
            staff_email: self.field(sub, FormField::ReferringStaffEmail)?,
            staff_phone: self.field(sub, FormField::ReferringStaffPhone)?,
        })
    }

    fn family(&self, sub: &RawSubmission) -> Result<Family> {
        let raw_address = self.field(sub, FormField::FamilyContactAddress)?;
        Ok(Family {
            contact: self.field(sub, FormField::FamilyContactName)?,
            address: clean_address(raw_address.as_deref()),
            phone: self.field(sub, FormField::FamilyContactPhone)?,
            email: self.field(sub, FormField::FamilyContactEmail)?,
        })
    }

    fn barrier_log(&self, sub: &RawSubmission) -> Result<BarrierLog> {
        Ok(BarrierLog {
            description: self.field(sub, FormField::BarrierDescription)?,
            list: self.field(sub, FormField::Barriers)?,
            cause: self.field(sub, FormField::BarrierCause)?,
            solution: self.field(sub, FormField::BarrierSolution)?,
            solution_path: self.field(sub, FormField::SolutionPathway)?,
        })
    }

    fn demographics(&self, sub: &RawSubmission) -> Result<Demographics> {
        Ok(Demographics {
            zipcode: self.field(sub, FormField::Zipcode)?,
            age: self.field(sub, FormField::Age)?,
            sex: self.field(sub, FormField::Sex)?,
            ethnicity: self.field(sub, FormField::Ethnicity)?,
        })
    }
}
