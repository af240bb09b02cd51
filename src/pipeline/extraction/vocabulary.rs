use std::collections::HashSet;

/// Built-in grocery vocabulary passed to the recognizer as custom words.
pub const GROCERY_VOCABULARY: &[&str] = &[
    // Produce
    "apple", "apples", "banana", "bananas", "orange", "oranges", "lemon", "lemons", "lime", "limes",
    "grape", "grapes", "strawberry", "strawberries", "blueberry", "blueberries", "raspberry",
    "raspberries", "blackberry", "blackberries", "peach", "peaches", "plum", "plums", "pear",
    "pears", "mango", "mangoes", "pineapple", "pineapples", "watermelon", "watermelons",
    "cantaloupe", "cantaloupes", "honeydew", "honeydews", "kiwi", "kiwis", "avocado", "avocados",
    "lettuce", "spinach", "kale", "arugula", "romaine", "cabbage", "cabbages", "broccoli",
    "cauliflower", "carrot", "carrots", "celery", "cucumber", "cucumbers", "tomato", "tomatoes",
    "pepper", "peppers", "onion", "onions", "garlic", "potato", "potatoes", "sweet potato",
    "sweet potatoes", "mushroom", "mushrooms", "zucchini", "zucchinis", "squash", "squashes",
    // Meat & seafood
    "chicken", "chickens", "beef", "pork", "lamb", "turkey", "turkeys", "duck", "ducks", "fish",
    "fishes", "salmon", "tuna", "shrimp", "shrimps", "crab", "crabs", "lobster", "lobsters",
    "bacon", "sausage", "sausages", "ham", "steak", "steaks", "ground beef", "chicken breast",
    "chicken breasts", "chicken thigh", "chicken thighs", "hotdog", "hotdogs", "hot dog",
    "hot dogs", "pep", "pepperoni",
    // Dairy & eggs
    "milk", "cream", "half and half", "yogurt", "yogurts", "cheese", "cheeses", "butter", "eggs",
    "sour cream", "cottage cheese", "cream cheese", "mozzarella", "cheddar", "parmesan", "swiss",
    "provolone", "greek yogurt",
    // Pantry
    "rice", "pasta", "noodles", "bread", "breads", "tortilla", "tortillas", "cereal", "cereals",
    "oats", "flour", "sugar", "salt", "oil", "oils", "vinegar", "sauce", "sauces", "soup", "soups",
    "canned", "beans", "nuts", "seeds", "spices", "bun", "buns", "hot dog bun", "hot dog buns",
    // Beverages
    "juice", "juices", "coffee", "tea", "water", "soda", "sodas", "beer", "beers", "wine", "wines",
    "almond milk", "soy milk", "orange juice", "apple juice", "cranberry juice", "coffee beans",
    "tea bags",
    // Snacks
    "chips", "crackers", "cookies", "chocolate", "chocolates", "candy", "candies", "popcorn",
    "pretzels", "dried fruit", "granola", "protein bar", "protein bars", "trail mix",
    // Frozen
    "frozen vegetables", "frozen fruit", "frozen fruits", "ice cream", "frozen pizza",
    "frozen pizzas", "frozen meals", "frozen waffles",
    // Baking
    "baking powder", "baking soda", "vanilla extract", "chocolate chips", "cocoa powder", "yeast",
    // Condiments
    "ketchup", "mustard", "mayonnaise", "relish", "hot sauce", "soy sauce", "bbq sauce",
    "salad dressing",
    // Packaging & units
    "pack", "packs", "box", "boxes", "bag", "bags", "bottle", "bottles", "jar", "jars", "can",
    "cans", "container", "containers", "lb", "lbs", "oz", "g", "kg", "ml", "l", "dozen", "dozens",
    "bunch", "bunches", "head", "heads", "piece", "pieces", "slice", "slices", "roll", "rolls",
    "loaf", "loaves", "carton", "cartons", "package", "packages",
    // Descriptors
    "organic", "fresh", "frozen", "dried", "whole", "grain", "low fat", "fat free", "gluten free",
    "natural", "local", "seasonal", "ripe", "raw", "cooked", "prepared",
];

/// Built-in vocabulary followed by the user's words, trimmed, without
/// blanks or repeats (first occurrence wins).
pub fn recognition_vocabulary(custom_words: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    GROCERY_VOCABULARY
        .iter()
        .copied()
        .chain(custom_words.iter().map(String::as_str))
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .filter(|w| seen.insert(w.to_lowercase()))
        .map(str::to_string)
        .collect()
}
