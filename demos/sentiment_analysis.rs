use anyhow::Result;
use finbert_sentiment::pipelines::sentiment_analysis_pipeline::*;

#[tokio::main]
async fn main() -> Result<()> {
    println!("Building pipeline...");

    let pipeline = SentimentAnalysisPipelineBuilder::finbert("ProsusAI/finbert")
        .build()
        .await?;

    println!("Pipeline built successfully.");

    let headlines = [
        "Company XYZ reports record profits in Q3",
        "Company ABC faces lawsuits over data breach",
        "",
    ];

    println!("\n=== Sentiment Analysis Results ===");
    for text in headlines {
        let (label, confidence) = analyze(text, &pipeline);
        println!("Text: \"{}\"", text);
        println!("Sentiment: {} (confidence: {:.4})", label, confidence);
    }

    Ok(())
}
