use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type RecipeId = String;

/// Generates a fresh opaque identifier for recipes and their sub-items.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns the next update timestamp for a record.
///
/// The result is strictly later than `previous`, so two mutations landing in
/// the same clock tick still produce distinct, ordered timestamps.
pub fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecipeTag {
    Breakfast,
    Lunch,
    Dinner,
    Dessert,
    Snack,
    Beverage,
    Vegan,
    Vegetarian,
    GlutenFree,
    DairyFree,
    LowCarb,
    Quick,
    Healthy,
}

impl RecipeTag {
    pub const ALL: [RecipeTag; 13] = [
        RecipeTag::Breakfast,
        RecipeTag::Lunch,
        RecipeTag::Dinner,
        RecipeTag::Dessert,
        RecipeTag::Snack,
        RecipeTag::Beverage,
        RecipeTag::Vegan,
        RecipeTag::Vegetarian,
        RecipeTag::GlutenFree,
        RecipeTag::DairyFree,
        RecipeTag::LowCarb,
        RecipeTag::Quick,
        RecipeTag::Healthy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeTag::Breakfast => "breakfast",
            RecipeTag::Lunch => "lunch",
            RecipeTag::Dinner => "dinner",
            RecipeTag::Dessert => "dessert",
            RecipeTag::Snack => "snack",
            RecipeTag::Beverage => "beverage",
            RecipeTag::Vegan => "vegan",
            RecipeTag::Vegetarian => "vegetarian",
            RecipeTag::GlutenFree => "gluten-free",
            RecipeTag::DairyFree => "dairy-free",
            RecipeTag::LowCarb => "low-carb",
            RecipeTag::Quick => "quick",
            RecipeTag::Healthy => "healthy",
        }
    }
}

impl fmt::Display for RecipeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecipeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        RecipeTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == needle)
            .ok_or_else(|| format!("unknown recipe tag '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

impl Ingredient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            quantity: None,
            preparation: None,
            optional: false,
        }
    }

    pub fn quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    pub order: u32,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_minutes: Option<u32>,
}

impl Step {
    pub fn new(order: u32, instruction: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            order,
            instruction: instruction.into(),
            timer_minutes: None,
        }
    }
}

/// A user-authored recipe, the record managed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<RecipeTag>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_minutes: Option<u32>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub dislikes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Builds a new recipe from a creation payload.
    ///
    /// A missing id is generated; both timestamps are set to `now` and the
    /// reaction counters default to zero.
    pub fn from_input(input: RecipeCreateInput, now: DateTime<Utc>) -> Self {
        Self {
            id: input.id.unwrap_or_else(generate_id),
            title: input.title,
            description: input.description,
            author: input.author,
            image_url: input.image_url,
            tags: input.tags,
            ingredients: input.ingredients,
            steps: input.steps,
            notes: input.notes,
            servings: input.servings,
            prep_time_minutes: input.prep_time_minutes,
            cook_time_minutes: input.cook_time_minutes,
            total_time_minutes: input.total_time_minutes,
            likes: input.likes.unwrap_or(0),
            dislikes: input.dislikes.unwrap_or(0),
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a patch, keeping `id` and `created_at` and bumping `updated_at`.
    pub fn patched(&self, patch: RecipeUpdateInput) -> Self {
        let mut next = self.clone();
        if let Some(title) = patch.title {
            next.title = title;
        }
        if let Some(description) = patch.description {
            next.description = Some(description);
        }
        if let Some(author) = patch.author {
            next.author = Some(author);
        }
        if let Some(image_url) = patch.image_url {
            next.image_url = Some(image_url);
        }
        if let Some(tags) = patch.tags {
            next.tags = tags;
        }
        if let Some(ingredients) = patch.ingredients {
            next.ingredients = ingredients;
        }
        if let Some(steps) = patch.steps {
            next.steps = steps;
        }
        if let Some(notes) = patch.notes {
            next.notes = Some(notes);
        }
        if let Some(servings) = patch.servings {
            next.servings = Some(servings);
        }
        if let Some(prep) = patch.prep_time_minutes {
            next.prep_time_minutes = Some(prep);
        }
        if let Some(cook) = patch.cook_time_minutes {
            next.cook_time_minutes = Some(cook);
        }
        if let Some(total) = patch.total_time_minutes {
            next.total_time_minutes = Some(total);
        }
        if let Some(likes) = patch.likes {
            next.likes = likes;
        }
        if let Some(dislikes) = patch.dislikes {
            next.dislikes = dislikes;
        }
        next.updated_at = next_timestamp(Some(self.updated_at));
        next
    }

    pub fn reactions(&self) -> ReactionCounts {
        ReactionCounts {
            likes: self.likes,
            dislikes: self.dislikes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCreateInput {
    #[serde(default)]
    pub id: Option<RecipeId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<RecipeTag>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub prep_time_minutes: Option<u32>,
    #[serde(default)]
    pub cook_time_minutes: Option<u32>,
    #[serde(default)]
    pub total_time_minutes: Option<u32>,
    #[serde(default)]
    pub likes: Option<u32>,
    #[serde(default)]
    pub dislikes: Option<u32>,
}

impl RecipeCreateInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = RecipeTag>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Patch view of this payload for the recipe `id`, used when an upsert
    /// hits an existing record. Unset fields, empty lists and a blank title
    /// are left out, so the stored values survive.
    pub fn into_patch(self, id: RecipeId) -> RecipeUpdateInput {
        fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
            (!items.is_empty()).then_some(items)
        }

        RecipeUpdateInput {
            id,
            title: (!self.title.trim().is_empty()).then_some(self.title),
            description: self.description,
            author: self.author,
            image_url: self.image_url,
            tags: non_empty(self.tags),
            ingredients: non_empty(self.ingredients),
            steps: non_empty(self.steps),
            notes: self.notes,
            servings: self.servings,
            prep_time_minutes: self.prep_time_minutes,
            cook_time_minutes: self.cook_time_minutes,
            total_time_minutes: self.total_time_minutes,
            likes: self.likes,
            dislikes: self.dislikes,
        }
    }
}

/// Partial update payload. Present fields replace stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeUpdateInput {
    pub id: RecipeId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<RecipeTag>>,
    #[serde(default)]
    pub ingredients: Option<Vec<Ingredient>>,
    #[serde(default)]
    pub steps: Option<Vec<Step>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub prep_time_minutes: Option<u32>,
    #[serde(default)]
    pub cook_time_minutes: Option<u32>,
    #[serde(default)]
    pub total_time_minutes: Option<u32>,
    #[serde(default)]
    pub likes: Option<u32>,
    #[serde(default)]
    pub dislikes: Option<u32>,
}

impl RecipeUpdateInput {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = RecipeTag>) -> Self {
        self.tags = Some(tags.into_iter().collect());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFilters {
    pub search_query: String,
    pub tags: Vec<RecipeTag>,
}

impl Default for RecipeFilters {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            tags: RecipeTag::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFiltersPatch {
    pub search_query: Option<String>,
    pub tags: Option<Vec<RecipeTag>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionCounts {
    pub likes: u32,
    pub dislikes: u32,
}
