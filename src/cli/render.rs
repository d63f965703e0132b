use recipebook::{Recipe, RecipeList};

fn tag_list(recipe: &Recipe) -> String {
    recipe
        .tags
        .iter()
        .map(|tag| tag.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn print_list(recipes: &RecipeList) {
    if recipes.is_empty() {
        println!("No recipes found.");
        return;
    }

    for recipe in recipes.iter() {
        println!(
            "{}  {}  (+{} / -{})  [{}]",
            recipe.id,
            recipe.title,
            recipe.likes,
            recipe.dislikes,
            tag_list(recipe)
        );
    }
    println!("{} recipe(s)", recipes.len());
}

pub fn print_reactions(recipe: &Recipe) {
    println!("{}: +{} / -{}", recipe.title, recipe.likes, recipe.dislikes);
}

pub fn print_recipe(recipe: &Recipe) {
    println!("{}", recipe.title);
    if let Some(author) = &recipe.author {
        println!("by {}", author);
    }
    if let Some(description) = &recipe.description {
        println!("{}", description);
    }
    println!("id: {}", recipe.id);
    println!("tags: [{}]", tag_list(recipe));

    let times = [
        ("prep", recipe.prep_time_minutes),
        ("cook", recipe.cook_time_minutes),
        ("total", recipe.total_time_minutes),
    ];
    let times: Vec<String> = times
        .iter()
        .filter_map(|(label, minutes)| minutes.map(|m| format!("{} {} min", label, m)))
        .collect();
    if !times.is_empty() {
        println!("{}", times.join(", "));
    }
    if let Some(servings) = recipe.servings {
        println!("serves {}", servings);
    }

    println!();
    println!("Ingredients:");
    for ingredient in &recipe.ingredients {
        let mut line = format!("  - {}", ingredient.name);
        if let Some(quantity) = &ingredient.quantity {
            line.push_str(&format!(" ({})", quantity));
        }
        if let Some(preparation) = &ingredient.preparation {
            line.push_str(&format!(", {}", preparation));
        }
        if ingredient.optional {
            line.push_str(" [optional]");
        }
        println!("{}", line);
    }

    println!("Steps:");
    for step in &recipe.steps {
        match step.timer_minutes {
            Some(minutes) => println!("  {}. {} ({} min)", step.order, step.instruction, minutes),
            None => println!("  {}. {}", step.order, step.instruction),
        }
    }

    if let Some(notes) = &recipe.notes {
        println!();
        println!("Notes: {}", notes);
    }
    println!();
    println!(
        "+{} / -{}  created {}  updated {}",
        recipe.likes,
        recipe.dislikes,
        recipe.created_at.to_rfc3339(),
        recipe.updated_at.to_rfc3339()
    );
}
