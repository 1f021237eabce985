/// Clases COCO en el orden de los modelos Ultralytics preentrenados.
pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket",
    "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana",
    "apple", "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza",
    "donut", "cake", "chair", "couch", "potted plant", "bed", "dining table", "toilet", "tv",
    "laptop", "mouse", "remote", "keyboard", "cell phone", "microwave", "oven", "toaster",
    "sink", "refrigerator", "book", "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

pub fn coco_labels() -> Vec<String> {
    COCO_CLASSES.iter().map(|s| s.to_string()).collect()
}

/// Lee la tabla `names` que Ultralytics guarda en los metadatos del ONNX exportado.
/// Formato: `{0: 'person', 1: 'bicycle', ...}`. Devuelve `None` si no es contigua desde 0.
/// Los nombres pueden contener comas: cada valor acaba en la comilla seguida de `, <n>:` o del final.
pub fn parse_names_metadata(raw: &str) -> Option<Vec<String>> {
    let mut rest = raw.trim().strip_prefix('{')?.strip_suffix('}')?.trim();
    let mut entries = Vec::new();

    while !rest.is_empty() {
        let (key, after_key) = rest.split_once(':')?;
        let idx: usize = key.trim().parse().ok()?;

        let value = after_key.trim_start();
        let quote = value.chars().next().filter(|c| *c == '\'' || *c == '"')?;
        let value = &value[1..];
        let end = closing_quote(value, quote)?;
        entries.push((idx, value[..end].to_string()));

        rest = value[end + 1..].trim_start();
        if let Some(next) = rest.strip_prefix(',') {
            rest = next.trim_start();
        }
    }

    entries.sort_by_key(|(idx, _)| *idx);
    if entries.is_empty() || entries.iter().enumerate().any(|(pos, (idx, _))| pos != *idx) {
        return None;
    }
    Some(entries.into_iter().map(|(_, name)| name).collect())
}

fn closing_quote(value: &str, quote: char) -> Option<usize> {
    value.match_indices(quote).map(|(i, _)| i).find(|&i| {
        let tail = value[i + 1..].trim_start();
        match tail.strip_prefix(',') {
            Some(next) => next
                .split_once(':')
                .is_some_and(|(key, _)| key.trim().parse::<usize>().is_ok()),
            None => tail.is_empty(),
        }
    })
}
