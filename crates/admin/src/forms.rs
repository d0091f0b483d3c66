//! Admin form parsing and validation.
//!
//! Product forms arrive as `multipart/form-data` because of the image upload.
//! Every field is checked and all errors are collected, so the form can be
//! shown again with a message next to each bad field.

use std::collections::{BTreeMap, HashMap};

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;

use techmart_core::catalog::{Category, MAX_DIAGONAL_LENGTH, MAX_TEXT_LENGTH};
use techmart_core::media::ImageRules;
use techmart_core::{CategoryId, Price, ProductKind, Slug, slugify};

use crate::db::products::{NotebookAttributes, SmartphoneAttributes};
use crate::db::{Attributes, ImageChange, ProductDraft};

/// Name of the file input on product forms.
pub const IMAGE_FIELD: &str = "image";

/// Name of the checkbox that removes the current image.
pub const CLEAR_IMAGE_FIELD: &str = "clear_image";

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Submitted form values.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    image: Option<Upload>,
}

impl FormData {
    /// Collect a multipart body. Only the image field is read as bytes.
    ///
    /// # Errors
    ///
    /// Returns the extractor error for malformed or oversized bodies.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if name == IMAGE_FIELD {
                let file_name = field.file_name().map(str::to_owned);
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was chosen
                if !bytes.is_empty() {
                    form.image = Some(Upload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// Build form data from name/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            image: None,
        }
    }

    /// Attach an uploaded image.
    #[must_use]
    pub fn with_image(mut self, upload: Upload) -> Self {
        self.image = Some(upload);
        self
    }

    /// Trimmed value of a text field, empty when absent.
    #[must_use]
    pub fn value(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", |v| v.trim())
    }

    /// Whether a checkbox was ticked.
    #[must_use]
    pub fn is_checked(&self, name: &str) -> bool {
        !matches!(self.value(name), "" | "off" | "false" | "0")
    }

    #[must_use]
    pub const fn image(&self) -> Option<&Upload> {
        self.image.as_ref()
    }
}

/// Field errors keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, String>);

impl FormErrors {
    /// Record an error; the first error for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One kind-specific input on the product form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub max_length: usize,
    pub checkbox: bool,
}

impl FieldSpec {
    const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            max_length: MAX_TEXT_LENGTH,
            checkbox: false,
        }
    }
}

const DIAGONAL: FieldSpec = FieldSpec {
    name: "diagonal",
    label: "Diagonal",
    max_length: MAX_DIAGONAL_LENGTH,
    checkbox: false,
};

const NOTEBOOK_FIELDS: [FieldSpec; 6] = [
    DIAGONAL,
    FieldSpec::text("display_type", "Display type"),
    FieldSpec::text("processor_freq", "Processor frequency"),
    FieldSpec::text("ram", "RAM"),
    FieldSpec::text("video", "Video memory"),
    FieldSpec::text("time_without_charge", "Battery life"),
];

const SMARTPHONE_FIELDS: [FieldSpec; 9] = [
    DIAGONAL,
    FieldSpec::text("display_type", "Display type"),
    FieldSpec::text("resolution", "Screen resolution"),
    FieldSpec::text("ram", "RAM"),
    FieldSpec {
        name: "sd",
        label: "SD card",
        max_length: 0,
        checkbox: true,
    },
    FieldSpec::text("sd_volume_max", "Max SD volume"),
    FieldSpec::text("battery_volume", "Battery capacity"),
    FieldSpec::text("main_cam_mp", "Main camera"),
    FieldSpec::text("front_cam_mp", "Front camera"),
];

/// The kind-specific inputs, in form order.
#[must_use]
pub const fn attribute_fields(kind: ProductKind) -> &'static [FieldSpec] {
    match kind {
        ProductKind::Notebook => &NOTEBOOK_FIELDS,
        ProductKind::Smartphone => &SMARTPHONE_FIELDS,
    }
}

/// Checkbox inputs of a kind with their initial value; every one starts
/// out checked.
pub fn checkbox_defaults(kind: ProductKind) -> impl Iterator<Item = (&'static str, String)> {
    attribute_fields(kind)
        .iter()
        .filter(|spec| spec.checkbox)
        .map(|spec| (spec.name, "on".to_owned()))
}

/// Validate a required, length-limited text field.
fn required_text(
    form: &FormData,
    errors: &mut FormErrors,
    name: &str,
    max_length: usize,
) -> String {
    let value = form.value(name);
    if value.is_empty() {
        errors.add(name, "This field is required");
    } else if value.chars().count() > max_length {
        errors.add(
            name,
            format!("Ensure this value has at most {max_length} characters"),
        );
    }
    value.to_owned()
}

/// Use the submitted slug, or derive one from `source` when left blank.
fn slug_field(form: &FormData, errors: &mut FormErrors, source: &str) -> Option<Slug> {
    let raw = form.value("slug");
    if raw.is_empty() {
        let derived = slugify(source);
        if derived.is_none() {
            errors.add("slug", "Enter a slug");
        }
        return derived;
    }
    Slug::parse(raw)
        .map_err(|e| errors.add("slug", e.to_string()))
        .ok()
}

/// Validate the category form.
///
/// # Errors
///
/// Returns the field errors when the name or slug is invalid.
pub fn validate_category(form: &FormData) -> Result<(String, Slug), FormErrors> {
    let mut errors = FormErrors::default();
    let name = required_text(form, &mut errors, "name", MAX_TEXT_LENGTH);
    let slug = slug_field(form, &mut errors, &name);

    match slug {
        Some(slug) if errors.is_empty() => Ok((name, slug)),
        _ => Err(errors),
    }
}

/// Validate the image part of a product form.
///
/// An upload is checked against [`ImageRules::PRODUCT`]; without one, the
/// `clear_image` checkbox decides between clearing and keeping.
///
/// # Errors
///
/// Returns the short field message of the first broken image rule.
pub fn validate_image(form: &FormData) -> Result<ImageChange, &'static str> {
    match form.image() {
        Some(upload) => ImageRules::PRODUCT
            .validate(upload.bytes.clone())
            .map(ImageChange::Replace)
            .map_err(|e| {
                tracing::debug!(
                    file = upload.file_name.as_deref().unwrap_or("-"),
                    error = %e,
                    "Rejected product image"
                );
                e.field_message()
            }),
        None if form.is_checked(CLEAR_IMAGE_FIELD) => Ok(ImageChange::Clear),
        None => Ok(ImageChange::Keep),
    }
}

/// Validate a product form for `kind`.
///
/// `choices` are the categories offered for the kind; any other submitted
/// category is a field error.
///
/// # Errors
///
/// Returns every field error found.
pub fn validate_product(
    kind: ProductKind,
    form: &FormData,
    choices: &[Category],
) -> Result<(ProductDraft, ImageChange), FormErrors> {
    let mut errors = FormErrors::default();

    let category_id = match form.value("category").parse::<i32>() {
        Ok(id) if choices.iter().any(|c| c.id.as_i32() == id) => Some(CategoryId::new(id)),
        Ok(_) => {
            errors.add(
                "category",
                "Select a valid choice. That choice is not one of the available choices.",
            );
            None
        }
        Err(_) => {
            errors.add("category", "This field is required");
            None
        }
    };

    let title = required_text(form, &mut errors, "title", MAX_TEXT_LENGTH);
    let slug = slug_field(form, &mut errors, &title);

    let description = Some(form.value("description").to_owned()).filter(|d| !d.is_empty());

    let price = match form.value("price") {
        "" => {
            errors.add("price", "This field is required");
            None
        }
        raw => Price::parse(raw)
            .map_err(|e| errors.add("price", e.to_string()))
            .ok(),
    };

    let mut values: HashMap<&'static str, String> = HashMap::new();
    let mut sd = false;
    for spec in attribute_fields(kind) {
        if spec.checkbox {
            sd = form.is_checked(spec.name);
        } else {
            let value = required_text(form, &mut errors, spec.name, spec.max_length);
            values.insert(spec.name, value);
        }
    }
    let mut take = |name: &str| values.remove(name).unwrap_or_default();
    let attributes = match kind {
        ProductKind::Notebook => Attributes::Notebook(NotebookAttributes {
            diagonal: take("diagonal"),
            display_type: take("display_type"),
            processor_freq: take("processor_freq"),
            ram: take("ram"),
            video: take("video"),
            time_without_charge: take("time_without_charge"),
        }),
        ProductKind::Smartphone => Attributes::Smartphone(SmartphoneAttributes {
            diagonal: take("diagonal"),
            display_type: take("display_type"),
            resolution: take("resolution"),
            ram: take("ram"),
            sd,
            sd_volume_max: take("sd_volume_max"),
            battery_volume: take("battery_volume"),
            main_cam_mp: take("main_cam_mp"),
            front_cam_mp: take("front_cam_mp"),
        }),
    };

    let image = validate_image(form).map_err(|msg| errors.add(IMAGE_FIELD, msg));

    match (category_id, slug, price, image) {
        (Some(category_id), Some(slug), Some(price), Ok(image)) if errors.is_empty() => Ok((
            ProductDraft {
                category_id,
                title,
                slug,
                description,
                price,
                attributes,
            },
            image,
        )),
        _ => Err(errors),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{ImageBuffer, ImageFormat, Rgb};

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn category(id: i32, slug: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: slug.to_owned(),
            slug: Slug::parse(slug).unwrap(),
        }
    }

    fn notebook_form() -> FormData {
        FormData::from_pairs([
            ("category", "1"),
            ("title", "ThinkPad X1 Carbon"),
            ("slug", ""),
            ("description", "  "),
            ("price", "1499.90"),
            ("diagonal", "14"),
            ("display_type", "IPS"),
            ("processor_freq", "3.4 GHz"),
            ("ram", "16 GB"),
            ("video", "Iris Xe"),
            ("time_without_charge", "12 h"),
        ])
    }

    fn upload(bytes: Vec<u8>) -> Upload {
        Upload {
            file_name: Some("photo.png".to_owned()),
            bytes,
        }
    }

    #[test]
    fn test_valid_notebook_without_image() {
        let choices = [category(1, "notebooks")];
        let (draft, image) =
            validate_product(ProductKind::Notebook, &notebook_form(), &choices).unwrap();

        assert_eq!(draft.slug.as_str(), "thinkpad-x1-carbon");
        assert_eq!(draft.description, None);
        assert_eq!(draft.kind(), ProductKind::Notebook);
        assert_eq!(image, ImageChange::Keep);
    }

    #[test]
    fn test_category_outside_choices_is_rejected() {
        let choices = [category(1, "notebooks")];
        let form = FormData::from_pairs(
            notebook_form()
                .fields
                .into_iter()
                .map(|(k, v)| if k == "category" { (k, "2".to_owned()) } else { (k, v) }),
        );

        let errors = validate_product(ProductKind::Notebook, &form, &choices).unwrap_err();
        assert!(errors.get("category").unwrap().starts_with("Select a valid choice"));
    }

    #[test]
    fn test_image_errors_are_field_errors() {
        let choices = [category(1, "notebooks")];
        let cases = [
            (png(300, 300), "Image resolution is below the minimum"),
            (png(900, 500), "Image resolution is above the maximum"),
            (b"GIF89a-not-really".to_vec(), "File is not a supported image"),
        ];

        for (bytes, message) in cases {
            let form = notebook_form().with_image(upload(bytes));
            let errors = validate_product(ProductKind::Notebook, &form, &choices).unwrap_err();
            assert_eq!(errors.get(IMAGE_FIELD), Some(message));
            assert_eq!(errors.iter().count(), 1);
        }
    }

    #[test]
    fn test_valid_image_is_replaced() {
        let choices = [category(1, "notebooks")];
        let form = notebook_form().with_image(upload(png(600, 600)));
        let (_, image) = validate_product(ProductKind::Notebook, &form, &choices).unwrap();
        assert!(matches!(image, ImageChange::Replace(ref img) if img.width() == 600));
    }

    #[test]
    fn test_clear_image_checkbox() {
        let form = FormData::from_pairs([(CLEAR_IMAGE_FIELD, "on")]);
        assert_eq!(validate_image(&form).unwrap(), ImageChange::Clear);
    }

    #[test]
    fn test_smartphone_fields_and_limits() {
        let choices = [category(5, "smartphones")];
        let form = FormData::from_pairs([
            ("category", "5"),
            ("title", "Pixel 9"),
            ("slug", "Pixel 9"),
            ("price", "12.345"),
            ("diagonal", "6.3 inch"),
            ("display_type", "OLED"),
            ("resolution", "2424x1080"),
            ("ram", "12 GB"),
            ("sd_volume_max", "-"),
            ("battery_volume", "4700 mAh"),
            ("main_cam_mp", "50"),
        ]);

        let errors = validate_product(ProductKind::Smartphone, &form, &choices).unwrap_err();
        assert!(errors.get("slug").is_some());
        assert!(errors.get("price").is_some());
        assert_eq!(
            errors.get("diagonal"),
            Some("Ensure this value has at most 5 characters")
        );
        assert_eq!(errors.get("front_cam_mp"), Some("This field is required"));
        assert!(errors.get("sd").is_none());
    }

    #[test]
    fn test_smartphone_sd_checkbox() {
        let choices = [category(5, "smartphones")];
        let mut pairs: Vec<(&str, &str)> = vec![
            ("category", "5"),
            ("title", "Galaxy A55"),
            ("price", "399"),
            ("diagonal", "6.6"),
            ("display_type", "AMOLED"),
            ("resolution", "2340x1080"),
            ("ram", "8 GB"),
            ("sd_volume_max", "1 TB"),
            ("battery_volume", "5000 mAh"),
            ("main_cam_mp", "50"),
            ("front_cam_mp", "32"),
        ];

        let (draft, _) =
            validate_product(ProductKind::Smartphone, &FormData::from_pairs(pairs.clone()), &choices)
                .unwrap();
        assert!(matches!(draft.attributes, Attributes::Smartphone(ref s) if !s.sd));

        pairs.push(("sd", "on"));
        let (draft, _) =
            validate_product(ProductKind::Smartphone, &FormData::from_pairs(pairs), &choices)
                .unwrap();
        assert!(matches!(draft.attributes, Attributes::Smartphone(ref s) if s.sd));
    }

    #[test]
    fn test_checkboxes_start_checked() {
        let defaults: Vec<_> = checkbox_defaults(ProductKind::Smartphone).collect();
        assert_eq!(defaults, vec![("sd", "on".to_owned())]);
        assert_eq!(checkbox_defaults(ProductKind::Notebook).count(), 0);
    }

    #[test]
    fn test_category_form_derives_slug() {
        let form = FormData::from_pairs([("name", "Gaming Notebooks"), ("slug", "")]);
        let (name, slug) = validate_category(&form).unwrap();
        assert_eq!(name, "Gaming Notebooks");
        assert_eq!(slug.as_str(), "gaming-notebooks");

        let errors = validate_category(&FormData::from_pairs([("name", "")])).unwrap_err();
        assert_eq!(errors.get("name"), Some("This field is required"));
    }

    #[test]
    fn test_attribute_fields_order() {
        let names: Vec<&str> = attribute_fields(ProductKind::Notebook)
            .iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(
            names,
            [
                "diagonal",
                "display_type",
                "processor_freq",
                "ram",
                "video",
                "time_without_charge"
            ]
        );
        assert_eq!(attribute_fields(ProductKind::Smartphone).len(), 9);
    }
}
