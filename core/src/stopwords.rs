use lazy_static::lazy_static;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

lazy_static! {
    static ref RUSSIAN: Vec<&'static str> = vec![
        "и","в","во","не","что","он","на","я","с","со","как","а","то","все","она","так","его","но","да","ты",
        "к","у","же","вы","за","бы","по","только","ее","мне","было","вот","от","меня","еще","нет","о","из",
        "ему","теперь","когда","даже","ну","вдруг","ли","если","уже","или","ни","быть","был","него","до","вас",
        "нибудь","опять","уж","вам","ведь","там","потом","себя","ничего","ей","может","они","тут","где","есть",
        "надо","ней","для","мы","тебя","их","чем","была","сам","чтоб","без","будто","чего","раз","тоже","себе",
        "под","будет","ж","тогда","кто","этот","того","потому","этого","какой","совсем","ним","здесь","этом",
        "один","почти","мой","тем","чтобы","нее","сейчас","были","куда","зачем","всех","никогда","можно","при",
        "наконец","два","об","другой","хоть","после","над","больше","тот","через","эти","нас","про","всего",
        "них","какая","много","разве","три","эту","моя","впрочем","хорошо","свою","этой","перед","иногда",
        "лучше","чуть","том","нельзя","такой","им","более","всегда","конечно","всю","между",
    ];
}

/// Immutable stopword set handed to the normalizer at construction.
#[derive(Debug, Clone, Default)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Stopwords {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The common Russian function-word list.
    pub fn russian() -> Self {
        RUSSIAN.iter().copied().collect()
    }

    /// One word per line; blank lines and `#` comments are skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Stopwords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { words: iter.into_iter().map(|w| w.as_ref().to_lowercase()).collect() }
    }
}
