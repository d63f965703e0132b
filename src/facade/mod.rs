pub mod recipe_book;

pub use recipe_book::RecipeBook;
