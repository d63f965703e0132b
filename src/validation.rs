//! Validation of raw recipe form values and their conversion into a
//! creation payload.

use crate::core::{Ingredient, RecipeCreateInput, RecipeTag, Step, generate_id};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

pub const MAX_TITLE_LENGTH: usize = 120;
pub const MIN_TITLE_LENGTH: usize = 3;
pub const MAX_DESCRIPTION_LENGTH: usize = 280;
pub const MAX_NOTES_LENGTH: usize = 500;
pub const MAX_TEXT_FIELD_LENGTH: usize = 120;
pub const MAX_STEP_LENGTH: usize = 600;
pub const MAX_TIME_MINUTES: u32 = 1440;
pub const MAX_IMAGE_URL_LENGTH: usize = 100_000;
pub const MAX_LIST_ITEMS: usize = 25;

lazy_static::lazy_static! {
    static ref WHOLE_NUMBER: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub issues: Vec<FieldIssue>,
}

impl ValidationErrors {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn for_field(&self, field: &str) -> impl Iterator<Item = &FieldIssue> + '_ {
        let field = field.to_string();
        self.issues.iter().filter(move |issue| issue.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .issues
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientForm {
    pub id: String,
    pub name: String,
    pub quantity: Option<String>,
    pub preparation: Option<String>,
    pub optional: bool,
}

impl IngredientForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepForm {
    pub id: String,
    pub instruction: String,
    pub timer_minutes: Option<String>,
}

impl StepForm {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            instruction: instruction.into(),
            timer_minutes: None,
        }
    }
}

/// Raw, string-typed values as a form collects them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeForm {
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<RecipeTag>,
    pub ingredients: Vec<IngredientForm>,
    pub steps: Vec<StepForm>,
    pub notes: Option<String>,
    pub servings: Option<String>,
    pub prep_time_minutes: Option<String>,
    pub cook_time_minutes: Option<String>,
    pub total_time_minutes: Option<String>,
}

/// Trimmed text, with blank input treated as absent.
pub fn sanitize_text(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A whole number, or `None` for blank or non-numeric input.
pub fn sanitize_number(value: Option<&str>) -> Option<u32> {
    let trimmed = sanitize_text(value)?;
    if !WHOLE_NUMBER.is_match(&trimmed) {
        return None;
    }
    trimmed.parse().ok()
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn check_optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max: usize,
    message: String,
) {
    if let Some(text) = sanitize_text(value) {
        if char_len(&text) > max {
            errors.push(field, message);
        }
    }
}

fn check_number(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    min: Option<u32>,
    max: Option<u32>,
    message: &str,
) -> Option<u32> {
    let text = sanitize_text(value)?;
    let Some(number) = WHOLE_NUMBER
        .is_match(&text)
        .then(|| text.parse::<u32>().ok())
        .flatten()
    else {
        errors.push(field, message);
        return None;
    };

    if let Some(min) = min {
        if number < min {
            errors.push(field, format!("Must be at least {}", min));
        }
    }
    if let Some(max) = max {
        if number > max {
            errors.push(field, format!("Must be {} or less", max));
        }
    }
    Some(number)
}

impl RecipeForm {
    /// Checks every field and reports all issues at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = self.title.trim();
        if char_len(title) < MIN_TITLE_LENGTH {
            errors.push("title", format!("Title must be at least {} characters", MIN_TITLE_LENGTH));
        } else if char_len(title) > MAX_TITLE_LENGTH {
            errors.push("title", format!("Title must be {} characters or less", MAX_TITLE_LENGTH));
        }

        check_optional_text(
            &mut errors,
            "description",
            self.description.as_deref(),
            MAX_DESCRIPTION_LENGTH,
            format!("Description must be {} characters or less", MAX_DESCRIPTION_LENGTH),
        );
        check_optional_text(
            &mut errors,
            "author",
            self.author.as_deref(),
            MAX_TEXT_FIELD_LENGTH,
            format!("Author must be {} characters or less", MAX_TEXT_FIELD_LENGTH),
        );
        check_optional_text(
            &mut errors,
            "imageUrl",
            self.image_url.as_deref(),
            MAX_IMAGE_URL_LENGTH,
            "Image reference is too long".to_string(),
        );
        check_optional_text(
            &mut errors,
            "notes",
            self.notes.as_deref(),
            MAX_NOTES_LENGTH,
            format!("Notes must be {} characters or less", MAX_NOTES_LENGTH),
        );

        let unique: HashSet<_> = self.tags.iter().collect();
        if unique.len() != self.tags.len() {
            errors.push("tags", "Tags must be unique");
        }

        self.validate_ingredients(&mut errors);
        self.validate_steps(&mut errors);

        check_number(&mut errors, "servings", self.servings.as_deref(), Some(1), None, "Servings must be a whole number");
        let prep = check_number(
            &mut errors,
            "prepTimeMinutes",
            self.prep_time_minutes.as_deref(),
            Some(0),
            Some(MAX_TIME_MINUTES),
            "Prep time must be a whole number",
        );
        let cook = check_number(
            &mut errors,
            "cookTimeMinutes",
            self.cook_time_minutes.as_deref(),
            Some(0),
            Some(MAX_TIME_MINUTES),
            "Cook time must be a whole number",
        );
        let total = check_number(
            &mut errors,
            "totalTimeMinutes",
            self.total_time_minutes.as_deref(),
            Some(0),
            Some(MAX_TIME_MINUTES),
            "Total time must be a whole number",
        );

        if let (Some(prep), Some(cook), Some(total)) = (prep, cook, total) {
            if total < prep.saturating_add(cook) {
                errors.push(
                    "totalTimeMinutes",
                    "Total time should be greater than or equal to prep + cook",
                );
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn validate_ingredients(&self, errors: &mut ValidationErrors) {
        if self.ingredients.is_empty() {
            errors.push("ingredients", "Add at least one ingredient");
        } else if self.ingredients.len() > MAX_LIST_ITEMS {
            errors.push("ingredients", "Too many ingredients");
        }

        for (index, ingredient) in self.ingredients.iter().enumerate() {
            let name = ingredient.name.trim();
            if name.is_empty() {
                errors.push(format!("ingredients[{}].name", index), "Ingredient name is required");
            } else if char_len(name) > MAX_TEXT_FIELD_LENGTH {
                errors.push(
                    format!("ingredients[{}].name", index),
                    format!("Ingredient name must be {} characters or less", MAX_TEXT_FIELD_LENGTH),
                );
            }
            check_optional_text(
                errors,
                &format!("ingredients[{}].quantity", index),
                ingredient.quantity.as_deref(),
                MAX_TEXT_FIELD_LENGTH,
                format!("Quantity must be {} characters or less", MAX_TEXT_FIELD_LENGTH),
            );
            check_optional_text(
                errors,
                &format!("ingredients[{}].preparation", index),
                ingredient.preparation.as_deref(),
                MAX_TEXT_FIELD_LENGTH,
                format!("Preparation must be {} characters or less", MAX_TEXT_FIELD_LENGTH),
            );
        }
    }

    fn validate_steps(&self, errors: &mut ValidationErrors) {
        if self.steps.is_empty() {
            errors.push("steps", "Add at least one step");
        } else if self.steps.len() > MAX_LIST_ITEMS {
            errors.push("steps", "Too many steps");
        }

        for (index, step) in self.steps.iter().enumerate() {
            let instruction = step.instruction.trim();
            if instruction.is_empty() {
                errors.push(format!("steps[{}].instruction", index), "Step instruction is required");
            } else if char_len(instruction) > MAX_STEP_LENGTH {
                errors.push(
                    format!("steps[{}].instruction", index),
                    format!("Step instruction must be {} characters or less", MAX_STEP_LENGTH),
                );
            }
            check_number(
                errors,
                &format!("steps[{}].timerMinutes", index),
                step.timer_minutes.as_deref(),
                None,
                Some(MAX_TIME_MINUTES),
                &format!("Timer must be {} minutes or less", MAX_TIME_MINUTES),
            );
        }
    }

    /// Converts form values into a creation payload: text trimmed, blanks
    /// dropped, numbers parsed, missing sub-item ids generated and steps
    /// renumbered from 1.
    pub fn into_create_input(self) -> RecipeCreateInput {
        let mut tags = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        RecipeCreateInput {
            id: None,
            title: self.title.trim().to_string(),
            description: sanitize_text(self.description.as_deref()),
            author: sanitize_text(self.author.as_deref()),
            image_url: sanitize_text(self.image_url.as_deref()),
            tags,
            ingredients: self
                .ingredients
                .into_iter()
                .map(|ingredient| Ingredient {
                    id: non_empty_id(ingredient.id),
                    name: ingredient.name.trim().to_string(),
                    quantity: sanitize_text(ingredient.quantity.as_deref()),
                    preparation: sanitize_text(ingredient.preparation.as_deref()),
                    optional: ingredient.optional,
                })
                .collect(),
            steps: self
                .steps
                .into_iter()
                .zip(1u32..)
                .map(|(step, order)| Step {
                    id: non_empty_id(step.id),
                    order,
                    instruction: step.instruction.trim().to_string(),
                    timer_minutes: sanitize_number(step.timer_minutes.as_deref()),
                })
                .collect(),
            notes: sanitize_text(self.notes.as_deref()),
            servings: sanitize_number(self.servings.as_deref()),
            prep_time_minutes: sanitize_number(self.prep_time_minutes.as_deref()),
            cook_time_minutes: sanitize_number(self.cook_time_minutes.as_deref()),
            total_time_minutes: sanitize_number(self.total_time_minutes.as_deref()),
            likes: None,
            dislikes: None,
        }
    }

    /// Validates, then converts.
    pub fn into_valid_input(self) -> crate::core::Result<RecipeCreateInput> {
        self.validate()?;
        Ok(self.into_create_input())
    }
}

fn non_empty_id(id: String) -> String {
    if id.trim().is_empty() { generate_id() } else { id }
}
